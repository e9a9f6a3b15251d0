//! # Port-Based Instance Lifecycle
//!
//! Some hosts don't hand the plugin a buffer per call. Instead they
//! connect each port to a memory location once, then just say "run N
//! samples" and read the outputs back from their own memory. The
//! lifecycle is:
//!
//! ```text
//! instantiate(rate) ─► connect_port(i, loc)* ─► activate() ─► run(n)* ─► cleanup()
//!                             ▲                      │          │
//!                             └──────────────────────┴──────────┘
//!                               (reconnect / reactivate any time)
//! ```
//!
//! Host memory is shared and mutable from the host's side while we hold
//! on to it, so locations are `Cell`s. A host that owns a `&mut [f32]`
//! can lend it with `Cell::from_mut(buf).as_slice_of_cells()`. Nothing is
//! copied: `run()` reads and writes the host's cells directly.

use std::cell::Cell;

use nih_plug::{nih_error, nih_warn};

use crate::dsp::engine::{Channel, ChannelControls, Controls, DelayEngine, StereoIo};
use crate::error::{EngineError, PortError};
use crate::ports::{Port, PortKind};

/// A host-owned location to connect a port to.
#[derive(Debug, Clone, Copy)]
pub enum PortLocation<'a> {
    /// A single value, read once at the start of every `run()`.
    Control(&'a Cell<f32>),
    /// A stream of samples, at least `sample_count` long on every `run()`.
    Audio(&'a [Cell<f32>]),
}

impl PortLocation<'_> {
    fn kind(&self) -> PortKind {
        match self {
            PortLocation::Control(_) => PortKind::Control,
            PortLocation::Audio(_) => PortKind::Audio,
        }
    }
}

/// Offset of the first audio port in the port table.
const FIRST_AUDIO_PORT: usize = Port::InputLeft.index();

/// A delay engine plus the host locations its ports are connected to.
///
/// Every method takes `&mut self` or `self`, so one instance is only ever
/// driven from one place at a time. Separate instances share nothing.
pub struct Instance<'a> {
    engine: DelayEngine,
    /// Indexed by control port index.
    controls: [Option<&'a Cell<f32>>; 4],
    /// Indexed by audio port index minus [`FIRST_AUDIO_PORT`].
    audio: [Option<&'a [Cell<f32>]>; 4],
}

impl<'a> Instance<'a> {
    /// Create an instance for `sample_rate`, with no ports connected.
    pub fn instantiate(sample_rate: u32) -> Result<Self, EngineError> {
        let engine = DelayEngine::new(sample_rate as f32).map_err(|err| {
            nih_error!("Failed to instantiate delay at {} Hz: {}", sample_rate, err);
            err
        })?;

        Ok(Self {
            engine,
            controls: [None; 4],
            audio: [None; 4],
        })
    }

    /// Connect port `index` to `location`, replacing any earlier
    /// connection of that port.
    ///
    /// # Errors
    ///
    /// [`PortError::UnknownPort`] for an index outside the port table,
    /// [`PortError::KindMismatch`] when a control port gets an audio
    /// location or the other way round. The existing connection is kept.
    pub fn connect_port(&mut self, index: usize, location: PortLocation<'a>) -> Result<(), PortError> {
        let Some(port) = Port::from_index(index) else {
            nih_warn!("Ignoring connection to unknown port {}", index);
            return Err(PortError::UnknownPort(index));
        };

        let expected = port.descriptor().kind;
        if location.kind() != expected {
            nih_warn!("Port {:?} expects a {:?} location", port, expected);
            return Err(PortError::KindMismatch { port, expected });
        }

        match location {
            PortLocation::Control(cell) => self.controls[port.index()] = Some(cell),
            PortLocation::Audio(cells) => self.audio[port.index() - FIRST_AUDIO_PORT] = Some(cells),
        }
        Ok(())
    }

    /// Clear the delay history before (re)starting playback.
    pub fn activate(&mut self) {
        self.engine.reset();
    }

    /// Process `sample_count` samples from the connected inputs into the
    /// connected outputs.
    ///
    /// Unconnected control ports use their default value, unconnected
    /// inputs read as silence and unconnected outputs are skipped. If a
    /// connected stream is shorter than `sample_count`, only that many
    /// samples are processed.
    pub fn run(&mut self, sample_count: usize) {
        let controls = Controls {
            left: ChannelControls {
                delay_seconds: self.control(Port::DelayLeft),
                dry_wet: self.control(Port::DryWetLeft),
            },
            right: ChannelControls {
                delay_seconds: self.control(Port::DelayRight),
                dry_wet: self.control(Port::DryWetRight),
            },
        };

        let [input_left, input_right, output_left, output_right] = self.audio;
        let mut io = CellIo {
            inputs: [input_left, input_right],
            outputs: [output_left, output_right],
        };
        self.engine.process(&controls, &mut io, sample_count);
    }

    /// Tear the instance down, freeing both delay buffers.
    ///
    /// Consuming `self` means an instance can't be cleaned up twice or
    /// used afterwards.
    pub fn cleanup(self) {
        drop(self);
    }

    pub fn engine(&self) -> &DelayEngine {
        &self.engine
    }

    fn control(&self, port: Port) -> f32 {
        match self.controls[port.index()] {
            Some(cell) => cell.get(),
            None => port.descriptor().default_value().unwrap_or_default(),
        }
    }
}

/// Connected audio ports, as seen by the engine.
struct CellIo<'a> {
    inputs: [Option<&'a [Cell<f32>]>; 2],
    outputs: [Option<&'a [Cell<f32>]>; 2],
}

impl StereoIo for CellIo<'_> {
    fn frames(&self) -> usize {
        self.inputs
            .iter()
            .chain(&self.outputs)
            .flatten()
            .map(|cells| cells.len())
            .min()
            .unwrap_or(usize::MAX)
    }

    #[inline]
    fn input(&self, channel: Channel, index: usize) -> f32 {
        self.inputs[channel.index()].map_or(0.0, |cells| cells[index].get())
    }

    #[inline]
    fn set_output(&mut self, channel: Channel, index: usize, sample: f32) {
        if let Some(cells) = self.outputs[channel.index()] {
            cells[index].set(sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(samples: &[f32]) -> Vec<Cell<f32>> {
        samples.iter().copied().map(Cell::new).collect()
    }

    fn values(cells: &[Cell<f32>]) -> Vec<f32> {
        cells.iter().map(Cell::get).collect()
    }

    fn impulse(len: usize) -> Vec<f32> {
        let mut signal = vec![0.0; len];
        signal[0] = 1.0;
        signal
    }

    /// The full host lifecycle: connect all eight ports, activate, run,
    /// read the outputs back from host memory.
    #[test]
    fn test_full_lifecycle() {
        let delay_l = Cell::new(0.1);
        let delay_r = Cell::new(0.2);
        let wet_l = Cell::new(1.0);
        let wet_r = Cell::new(1.0);
        let in_l = cells(&impulse(32));
        let in_r = cells(&impulse(32));
        let out_l = cells(&[0.0; 32]);
        let out_r = cells(&[0.0; 32]);

        let mut instance = Instance::instantiate(100).unwrap();
        let locations = [
            PortLocation::Control(&delay_l),
            PortLocation::Control(&delay_r),
            PortLocation::Control(&wet_l),
            PortLocation::Control(&wet_r),
            PortLocation::Audio(&in_l),
            PortLocation::Audio(&in_r),
            PortLocation::Audio(&out_l),
            PortLocation::Audio(&out_r),
        ];
        for (index, location) in locations.into_iter().enumerate() {
            instance.connect_port(index, location).unwrap();
        }
        instance.activate();
        instance.run(32);

        assert_eq!(values(&out_l).iter().position(|&s| s != 0.0), Some(10));
        assert_eq!(values(&out_r).iter().position(|&s| s != 0.0), Some(20));
        assert_eq!(instance.engine().write_cursor(), 32);

        instance.cleanup();
    }

    /// Controls are read at the start of each run, so the host can change
    /// them between blocks without reconnecting.
    #[test]
    fn test_control_changes_between_runs() {
        let wet = Cell::new(0.0);
        let input = cells(&[0.5; 8]);
        let output = cells(&[0.0; 8]);

        let mut instance = Instance::instantiate(100).unwrap();
        instance.connect_port(2, PortLocation::Control(&wet)).unwrap();
        instance.connect_port(4, PortLocation::Audio(&input)).unwrap();
        instance.connect_port(6, PortLocation::Audio(&output)).unwrap();

        instance.run(8);
        assert_eq!(values(&output), [0.5; 8], "fully dry");

        // Fully wet with the default 1 s delay: nothing has come back yet.
        wet.set(1.0);
        instance.run(8);
        assert_eq!(values(&output), [0.0; 8], "fully wet");
    }

    /// Unconnected control ports fall back to the table defaults
    /// (1 s delay, 50% wet).
    #[test]
    fn test_unconnected_controls_use_defaults() {
        let input = cells(&impulse(120));
        let output = cells(&[0.0; 120]);

        let mut instance = Instance::instantiate(100).unwrap();
        instance.connect_port(4, PortLocation::Audio(&input)).unwrap();
        instance.connect_port(6, PortLocation::Audio(&output)).unwrap();
        instance.run(120);

        let out = values(&output);
        assert_eq!(out[0], 0.5);
        assert_eq!(out[100], 0.5);
        assert_eq!(out.iter().filter(|&&s| s != 0.0).count(), 2);
    }

    /// A host may point an input and output at the same memory.
    #[test]
    fn test_in_place_connection() {
        let wet = Cell::new(0.0);
        let shared = cells(&[0.25, -0.5, 0.75]);

        let mut instance = Instance::instantiate(100).unwrap();
        instance.connect_port(2, PortLocation::Control(&wet)).unwrap();
        instance.connect_port(4, PortLocation::Audio(&shared)).unwrap();
        instance.connect_port(6, PortLocation::Audio(&shared)).unwrap();
        instance.run(3);

        assert_eq!(values(&shared), [0.25, -0.5, 0.75]);
    }

    #[test]
    fn test_connect_rejects_bad_ports() {
        let value = Cell::new(0.0);
        let stream = cells(&[0.0; 4]);
        let mut instance = Instance::instantiate(100).unwrap();

        assert_eq!(
            instance.connect_port(8, PortLocation::Control(&value)),
            Err(PortError::UnknownPort(8))
        );
        assert_eq!(
            instance.connect_port(0, PortLocation::Audio(&stream)),
            Err(PortError::KindMismatch {
                port: Port::DelayLeft,
                expected: PortKind::Control,
            })
        );
        assert_eq!(
            instance.connect_port(7, PortLocation::Control(&value)),
            Err(PortError::KindMismatch {
                port: Port::OutputRight,
                expected: PortKind::Audio,
            })
        );
    }

    /// Reconnecting a port moves output to the new location.
    #[test]
    fn test_reconnect_replaces_location() {
        let wet = Cell::new(0.0);
        let input = cells(&[1.0; 4]);
        let first = cells(&[0.0; 4]);
        let second = cells(&[0.0; 4]);

        let mut instance = Instance::instantiate(100).unwrap();
        instance.connect_port(3, PortLocation::Control(&wet)).unwrap();
        instance.connect_port(5, PortLocation::Audio(&input)).unwrap();
        instance.connect_port(7, PortLocation::Audio(&first)).unwrap();
        instance.connect_port(7, PortLocation::Audio(&second)).unwrap();
        instance.run(4);

        assert_eq!(values(&first), [0.0; 4]);
        assert_eq!(values(&second), [1.0; 4]);
    }

    /// Reactivating an instance drops the echoes of its previous use.
    #[test]
    fn test_activate_clears_history() {
        let delay = Cell::new(0.05);
        let wet = Cell::new(1.0);
        let input = cells(&impulse(10));
        let output = cells(&[0.0; 10]);

        let mut instance = Instance::instantiate(100).unwrap();
        instance.connect_port(0, PortLocation::Control(&delay)).unwrap();
        instance.connect_port(2, PortLocation::Control(&wet)).unwrap();
        instance.connect_port(4, PortLocation::Audio(&input)).unwrap();
        instance.connect_port(6, PortLocation::Audio(&output)).unwrap();
        instance.activate();
        instance.run(3);

        // The impulse is in the buffer but hasn't come out yet.
        instance.activate();
        for cell in &input {
            cell.set(0.0);
        }
        instance.run(10);
        assert_eq!(values(&output), [0.0; 10]);
    }

    #[test]
    fn test_instantiate_rejects_zero_rate() {
        assert!(matches!(
            Instance::instantiate(0),
            Err(EngineError::InvalidSampleRate(_))
        ));
    }

    /// Hosts can lend plain sample buffers without copying.
    #[test]
    fn test_borrowed_host_buffers() {
        let wet = Cell::new(0.0);
        let mut host_in = [0.1, 0.2, 0.3, 0.4];
        let mut host_out = [0.0; 4];
        {
            let input = Cell::from_mut(&mut host_in[..]).as_slice_of_cells();
            let output = Cell::from_mut(&mut host_out[..]).as_slice_of_cells();

            let mut instance = Instance::instantiate(48_000).unwrap();
            instance.connect_port(2, PortLocation::Control(&wet)).unwrap();
            instance.connect_port(4, PortLocation::Audio(input)).unwrap();
            instance.connect_port(6, PortLocation::Audio(output)).unwrap();
            instance.run(4);
        }
        assert_eq!(host_out, host_in);
    }
}
