//! # Plugin Parameters
//!
//! The four control ports, as host-automatable parameters. Names, ranges
//! and defaults come straight from the port table in [`crate::ports`], so
//! a host that talks to the plugin through CLAP/VST3 sees the same
//! controls as one that connects ports by index.
//!
//! ## No smoothing
//!
//! None of these parameters has a smoother. The engine samples each value
//! once per block and jumps to it, which is how the delay is meant to
//! behave: moving the delay time while audio plays clicks.

use nih_plug::prelude::*;

use crate::dsp::engine::{ChannelControls, Controls};
use crate::ports::{Port, RangeHint, DELAY_HINT, DRY_WET_HINT};

/// All user-facing parameters of the stereo delay.
///
/// The `#[id = "..."]` strings are what hosts store in presets and
/// sessions. Once published, never change them.
#[derive(Params)]
pub struct DelayParams {
    /// **Delay (Left)**: seconds between the left input and its echo.
    #[id = "delay_l"]
    pub delay_left: FloatParam,

    /// **Delay (Right)**: seconds between the right input and its echo.
    #[id = "delay_r"]
    pub delay_right: FloatParam,

    /// **Dry/Wet (Left)**: 0% is the untouched input, 100% only the echo.
    #[id = "mix_l"]
    pub dry_wet_left: FloatParam,

    /// **Dry/Wet (Right)**
    #[id = "mix_r"]
    pub dry_wet_right: FloatParam,
}

impl DelayParams {
    /// Current values of all four controls, unsmoothed.
    pub fn controls(&self) -> Controls {
        Controls {
            left: ChannelControls {
                delay_seconds: self.delay_left.value(),
                dry_wet: self.dry_wet_left.value(),
            },
            right: ChannelControls {
                delay_seconds: self.delay_right.value(),
                dry_wet: self.dry_wet_right.value(),
            },
        }
    }
}

fn linear(hint: RangeHint) -> FloatRange {
    FloatRange::Linear {
        min: hint.lower,
        max: hint.upper,
    }
}

fn delay_param(port: Port) -> FloatParam {
    FloatParam::new(
        port.descriptor().name,
        DELAY_HINT.default_value(),
        linear(DELAY_HINT),
    )
    .with_unit(" s")
    // Millisecond steps. The engine truncates to whole samples anyway.
    .with_step_size(0.001)
}

fn dry_wet_param(port: Port) -> FloatParam {
    FloatParam::new(
        port.descriptor().name,
        DRY_WET_HINT.default_value(),
        linear(DRY_WET_HINT),
    )
    .with_unit("%")
    // Display as percentage: 0.50 → "50.0%"
    .with_value_to_string(formatters::v2s_f32_percentage(1))
    .with_string_to_value(formatters::s2v_f32_percentage())
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            delay_left: delay_param(Port::DelayLeft),
            delay_right: delay_param(Port::DelayRight),
            dry_wet_left: dry_wet_param(Port::DryWetLeft),
            dry_wet_right: dry_wet_param(Port::DryWetRight),
        }
    }
}
