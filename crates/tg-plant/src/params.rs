//! Circuit parameters and the closed-form operating point.

use crate::error::{PlantError, PlantResult};
use tg_core::units::{Capacitance, Inductance, Resistance, Voltage, Power};
use tg_core::{Real, ensure_finite};

/// Physical circuit constants of the buck converter.
///
/// Values are stored as raw SI floats; use [`CircuitParams::new`] to build
/// them from typed quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitParams {
    /// Input voltage (V)
    pub v_in: Real,
    /// Inductor winding resistance (Ω)
    pub r_l: Real,
    /// Constant-resistance load in parallel with the capacitor (Ω)
    pub r_c: Real,
    /// Inductance (H)
    pub l: Real,
    /// Capacitance (F)
    pub c: Real,
}

impl CircuitParams {
    /// Build circuit parameters from typed SI quantities.
    pub fn new(
        v_in: Voltage,
        r_l: Resistance,
        r_c: Resistance,
        l: Inductance,
        c: Capacitance,
    ) -> PlantResult<Self> {
        use uom::si::capacitance::farad;
        use uom::si::electric_potential::volt;
        use uom::si::electrical_resistance::ohm;
        use uom::si::inductance::henry;

        Self::from_si(
            v_in.get::<volt>(),
            r_l.get::<ohm>(),
            r_c.get::<ohm>(),
            l.get::<henry>(),
            c.get::<farad>(),
        )
    }

    /// Build circuit parameters from raw SI floats.
    pub fn from_si(v_in: Real, r_l: Real, r_c: Real, l: Real, c: Real) -> PlantResult<Self> {
        if v_in <= 0.0 {
            return Err(PlantError::InvalidArg {
                what: "input voltage must be positive",
            });
        }
        if r_l < 0.0 {
            return Err(PlantError::InvalidArg {
                what: "winding resistance must be non-negative",
            });
        }
        if r_c <= 0.0 {
            return Err(PlantError::InvalidArg {
                what: "load resistance must be positive",
            });
        }
        if l <= 0.0 {
            return Err(PlantError::InvalidArg {
                what: "inductance must be positive",
            });
        }
        if c <= 0.0 {
            return Err(PlantError::InvalidArg {
                what: "capacitance must be positive",
            });
        }
        Ok(Self { v_in, r_l, r_c, l, c })
    }
}

/// Nominal steady-state values around which the plant is linearized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    /// Constant-power-load demand (W)
    pub p_cpl: Real,
    /// Capacitor voltage (V)
    pub v_c: Real,
    /// Inductor current (A)
    pub i_l: Real,
    /// Duty cycle (dimensionless)
    pub d: Real,
}

impl OperatingPoint {
    /// Derive the operating point from the desired load power and
    /// capacitor voltage:
    ///
    /// i_l = v_c / r_c + p_cpl / v_c
    /// d   = (r_l * i_l) / v_in + v_c / v_in
    pub fn derive(circuit: &CircuitParams, p_cpl: Real, v_c: Real) -> PlantResult<Self> {
        let i_l = ensure_finite(v_c / circuit.r_c + p_cpl / v_c, "operating current")?;
        let d = ensure_finite(
            (circuit.r_l * i_l) / circuit.v_in + v_c / circuit.v_in,
            "operating duty cycle",
        )?;
        Ok(Self { p_cpl, v_c, i_l, d })
    }
}

/// Circuit parameters plus their derived operating point.
///
/// Immutable per scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantParams {
    pub circuit: CircuitParams,
    pub op: OperatingPoint,
}

impl PlantParams {
    /// Build parameters for a desired load power (W) and capacitor
    /// voltage (V).
    pub fn new(circuit: CircuitParams, p_cpl: Real, v_c: Real) -> PlantResult<Self> {
        let op = OperatingPoint::derive(&circuit, p_cpl, v_c)?;
        Ok(Self { circuit, op })
    }

    /// Typed-quantity variant of [`PlantParams::new`].
    pub fn for_desired(circuit: CircuitParams, p_cpl: Power, v_c: Voltage) -> PlantResult<Self> {
        use uom::si::electric_potential::volt;
        use uom::si::power::watt;
        Self::new(circuit, p_cpl.get::<watt>(), v_c.get::<volt>())
    }
}
