//! # Loveless Stereo Delay: An AU/VST3/CLAP Delay Line
//!
//! A plain stereo delay built with [nih-plug](https://github.com/robbert-vdh/nih-plug).
//! Each channel has its own delay time (up to five seconds) and its own
//! dry/wet balance. There is no feedback and no interpolation: every echo
//! is one exact copy of the input, a whole number of samples later.
//!
//! ## Signal Flow (per channel)
//!
//! ```text
//! Input ──┬──────────────────────────────────── × (1 - wet) ───┐
//!         │                                                    │
//!         └──► [Ring Buffer, 2^n samples] ──► delayed ── × wet ──►(+)──► Output
//!               (written after it is read)
//! ```
//!
//! ## Layout
//!
//! - [`dsp`]: the delay engine. Everything that runs on the audio thread.
//! - [`ports`]: the fixed 8-port table and the plugin's identity.
//! - [`instance`]: the engine driven through connected host memory
//!   (instantiate / connect_port / activate / run / cleanup).
//! - This file: the same engine exported as CLAP, VST3 and AUv2.

pub mod dsp;
pub mod error;
pub mod instance;
mod params;
pub mod ports;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::engine::{DelayEngine, InPlaceIo};
use nih_plug::prelude::*;
use params::DelayParams;

/// The plugin as the CLAP/VST3 wrappers see it.
///
/// Parameters are shared with the host through an `Arc` and can be read
/// from any thread. The engine is owned by the audio thread and only
/// touched from `initialize()`, `reset()` and `process()`, which the host
/// never calls concurrently.
struct LovelessStereoDelay {
    params: Arc<DelayParams>,

    /// `None` until the host tells us the sample rate in `initialize()`.
    engine: Option<DelayEngine>,
}

impl Default for LovelessStereoDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(DelayParams::default()),
            engine: None,
        }
    }
}

impl Plugin for LovelessStereoDelay {
    const NAME: &'static str = ports::DESCRIPTOR.name;
    const VENDOR: &'static str = ports::DESCRIPTOR.maker;
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo in, stereo out. The two channels are separate delay lines,
    // so there's no meaningful mono layout.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    }];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Controls are read once per block, so there's nothing to gain from
    // splitting blocks at automation points.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the delay buffers for the host's sample rate.
    ///
    /// The host calls this again whenever the audio configuration changes.
    /// If the sample rate is the same as before we keep the existing
    /// buffers; `reset()` clears them right after.
    ///
    /// Returning `false` tells the host this instance can't run.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate;
        if let Some(engine) = &self.engine {
            if engine.sample_rate() == sample_rate {
                return true;
            }
        }

        // Drop the old buffers before allocating new ones so both sets
        // never exist at once.
        self.engine = None;
        match DelayEngine::new(sample_rate) {
            Ok(engine) => {
                nih_log!(
                    "Allocated 2 x {} sample delay buffers at {} Hz",
                    engine.buffer_size(),
                    sample_rate
                );
                self.engine = Some(engine);
                true
            }
            Err(err) => {
                nih_error!("Could not initialize the delay: {}", err);
                false
            }
        }
    }

    /// Called when playback stops or the plugin is (re)activated. Clears
    /// the delay history so old echoes don't leak into the next run.
    fn reset(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.reset();
        }
    }

    /// Run one host buffer through the delay, in place.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let Some(engine) = &mut self.engine else {
            nih_debug_assert_failure!("process() called before initialize()");
            return ProcessStatus::Normal;
        };

        let controls = self.params.controls();
        let sample_count = buffer.samples();
        let [left, right] = buffer.as_slice() else {
            nih_debug_assert_failure!("expected a stereo buffer");
            return ProcessStatus::Normal;
        };
        engine.process(&controls, &mut InPlaceIo::new(left, right), sample_count);

        // Keep the host calling process() after the input goes silent
        // until the longest echo has played out.
        ProcessStatus::Tail(engine.tail_samples(&controls))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessStereoDelay {
    const CLAP_ID: &'static str = "com.loveless-audio.stereo-delay-line";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A stereo delay line with independent delay and dry/wet per channel");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for LovelessStereoDelay {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssStereoDly01";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper re-exports the CLAP entry point as AUv2 for Logic Pro.

nih_export_clap!(LovelessStereoDelay);
nih_export_vst3!(LovelessStereoDelay);

clap_wrapper::export_auv2!();
