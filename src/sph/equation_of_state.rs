use crate::units::Real;

pub trait EquationOfState {
    // pressure of a particle given its local density (and thermal energy for thermal equations of state)
    fn pressure(&self, local_density: Real, thermal_energy: Real) -> Real;

    // local speed of sound, c² = dp/dρ at the given state
    fn sound_speed(&self, local_density: Real, thermal_energy: Real) -> Real;

    // whether pressure() reads the thermal energy argument, i.e. whether particles need an energy field
    fn requires_thermal_energy(&self) -> bool {
        false
    }
}

// γ is hardcoded to 7 as proposed in the paper
const TAIT_EQUATION_GAMMA: i32 = 7;

// Tait equation as in Becker & Teschner 2007 WCSPH07
// https://cg.informatik.uni-freiburg.de/publications/2007_SCA_SPH.pdf
pub struct TaitEquationOfState {
    fluid_density: Real,
    stiffness: Real, // denoted as B. B = density0 * speed_of_sound * speed_of_sound / γ.
}

impl TaitEquationOfState {
    pub fn new(fluid_density: Real, speed_of_sound: Real) -> TaitEquationOfState {
        TaitEquationOfState {
            fluid_density,
            stiffness: fluid_density * speed_of_sound * speed_of_sound / TAIT_EQUATION_GAMMA as Real,
        }
    }

    // target_density_variation:    allowed density variation, denoted as η in the paper. defaults to 1%==0.01
    // expected_max_flow_speed:     expected speed of the fluid in m/s. possible estimate is sqrt(2 * gravity * falling_height)
    pub fn for_target_density_variation(fluid_density: Real, expected_max_flow_speed: Real, target_density_variation: Real) -> TaitEquationOfState {
        // real speed of sound of the fluid is usually much higher, but a higher stiffness than
        // necessary for the density variation target only makes the pressure field harder to handle
        let speed_of_sound = expected_max_flow_speed / target_density_variation.sqrt();
        Self::new(fluid_density, speed_of_sound)
    }
}

impl EquationOfState for TaitEquationOfState {
    #[inline]
    fn pressure(&self, local_density: Real, _thermal_energy: Real) -> Real {
        // The max on the density ratio is due to pressure clamping to work around particle deficiency problem. Good explanation here:
        // https://github.com/InteractiveComputerGraphics/SPlisHSPlasH/issues/36#issuecomment-495883932
        self.stiffness * ((local_density / self.fluid_density).max(1.0).powi(TAIT_EQUATION_GAMMA) - 1.0)
    }

    #[inline]
    fn sound_speed(&self, local_density: Real, _thermal_energy: Real) -> Real {
        let compression = (local_density / self.fluid_density).max(1.0);
        (self.stiffness * TAIT_EQUATION_GAMMA as Real / self.fluid_density * compression.powi(TAIT_EQUATION_GAMMA - 1)).sqrt()
    }
}

// Ideal gas closure p = (γ - 1) ρ ε, the usual choice for astrophysical test problems.
pub struct IdealGasEquationOfState {
    pub adiabatic_index: Real, // γ. 5/3 for a monatomic gas.
}

impl IdealGasEquationOfState {
    pub fn new(adiabatic_index: Real) -> IdealGasEquationOfState {
        IdealGasEquationOfState { adiabatic_index }
    }
}

impl EquationOfState for IdealGasEquationOfState {
    #[inline]
    fn pressure(&self, local_density: Real, thermal_energy: Real) -> Real {
        (self.adiabatic_index - 1.0) * local_density * thermal_energy
    }

    #[inline]
    fn sound_speed(&self, _local_density: Real, thermal_energy: Real) -> Real {
        // c² = γ p / ρ = γ (γ - 1) ε
        (self.adiabatic_index * (self.adiabatic_index - 1.0) * thermal_energy).sqrt()
    }

    fn requires_thermal_energy(&self) -> bool {
        true
    }
}
