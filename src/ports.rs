//! # Ports and Plugin Descriptor
//!
//! The plugin talks to a host through eight fixed ports: four control
//! inputs (one delay time and one dry/wet balance per channel) and four
//! audio streams (stereo in, stereo out). The indices are part of the
//! hosting contract. Hosts save sessions by port index, so these must
//! never be reordered.
//!
//! ```text
//! 0  Delay (Seconds) (Left)     control in   [0, 5]   default 1
//! 1  Delay (Seconds) (Right)    control in   [0, 5]   default 1
//! 2  Dry/Wet Balance (Left)     control in   [0, 1]   default 0.5
//! 3  Dry/Wet Balance (Right)    control in   [0, 1]   default 0.5
//! 4  Input (Left)               audio in
//! 5  Input (Right)              audio in
//! 6  Output (Left)              audio out
//! 7  Output (Right)             audio out
//! ```

use crate::dsp::engine::MAX_DELAY_SECONDS;

/// Number of ports exposed by the plugin.
pub const PORT_COUNT: usize = 8;

/// One of the eight fixed plugin ports. The discriminant is the port index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Port {
    DelayLeft = 0,
    DelayRight = 1,
    DryWetLeft = 2,
    DryWetRight = 3,
    InputLeft = 4,
    InputRight = 5,
    OutputLeft = 6,
    OutputRight = 7,
}

impl Port {
    /// Every port, in index order.
    pub const ALL: [Port; PORT_COUNT] = [
        Port::DelayLeft,
        Port::DelayRight,
        Port::DryWetLeft,
        Port::DryWetRight,
        Port::InputLeft,
        Port::InputRight,
        Port::OutputLeft,
        Port::OutputRight,
    ];

    /// Look up a port by its host-facing index.
    pub fn from_index(index: usize) -> Option<Port> {
        Self::ALL.get(index).copied()
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The static description of this port.
    pub fn descriptor(self) -> &'static PortDescriptor {
        &PORTS[self.index()]
    }
}

/// Whether the host writes into a port or reads from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// What kind of location a port is connected to.
///
/// A control port points at a single value that is sampled once per
/// block. An audio port points at a stream of `sample_count` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Control,
    Audio,
}

/// Symbolic default for a control port, resolved against its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// Exactly `1.0`.
    One,
    /// Halfway between the lower and upper bound.
    Middle,
}

/// Bounds and default of a control port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeHint {
    pub lower: f32,
    pub upper: f32,
    pub default: DefaultValue,
}

impl RangeHint {
    /// The concrete default value the host should use.
    pub fn default_value(&self) -> f32 {
        match self.default {
            DefaultValue::One => 1.0,
            DefaultValue::Middle => (self.lower + self.upper) * 0.5,
        }
    }
}

/// Static description of one port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortDescriptor {
    pub name: &'static str,
    pub direction: PortDirection,
    pub kind: PortKind,
    /// Only control ports carry a range.
    pub hint: Option<RangeHint>,
}

impl PortDescriptor {
    /// Default value of a control port, `None` for audio ports.
    pub fn default_value(&self) -> Option<f32> {
        self.hint.map(|hint| hint.default_value())
    }
}

/// Range of both delay-time ports, in seconds.
pub const DELAY_HINT: RangeHint = RangeHint {
    lower: 0.0,
    upper: MAX_DELAY_SECONDS,
    default: DefaultValue::One,
};

/// Range of both dry/wet ports.
pub const DRY_WET_HINT: RangeHint = RangeHint {
    lower: 0.0,
    upper: 1.0,
    default: DefaultValue::Middle,
};

const fn control(name: &'static str, hint: RangeHint) -> PortDescriptor {
    PortDescriptor {
        name,
        direction: PortDirection::Input,
        kind: PortKind::Control,
        hint: Some(hint),
    }
}

const fn audio(name: &'static str, direction: PortDirection) -> PortDescriptor {
    PortDescriptor {
        name,
        direction,
        kind: PortKind::Audio,
        hint: None,
    }
}

/// The port table, indexed by [`Port::index`].
pub const PORTS: [PortDescriptor; PORT_COUNT] = [
    control("Delay (Seconds) (Left)", DELAY_HINT),
    control("Delay (Seconds) (Right)", DELAY_HINT),
    control("Dry/Wet Balance (Left)", DRY_WET_HINT),
    control("Dry/Wet Balance (Right)", DRY_WET_HINT),
    audio("Input (Left)", PortDirection::Input),
    audio("Input (Right)", PortDirection::Input),
    audio("Output (Left)", PortDirection::Output),
    audio("Output (Right)", PortDirection::Output),
];

/// Identity metadata the host reads before instantiating anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PluginDescriptor {
    pub unique_id: u32,
    /// Short machine-friendly name, unique within the library.
    pub label: &'static str,
    pub name: &'static str,
    pub maker: &'static str,
    pub copyright: &'static str,
    /// The plugin never blocks or allocates inside `run()`.
    pub hard_rt_capable: bool,
    pub ports: &'static [PortDescriptor; PORT_COUNT],
}

/// The only plugin this library provides.
pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    unique_id: 399,
    label: "delay_5s_stereo",
    name: "Simple Stereo Delay Line",
    maker: "Loveless Audio",
    copyright: "GPL-3.0-or-later",
    hard_rt_capable: true,
    ports: &PORTS,
};

/// Descriptor lookup by index. Index 0 is the stereo delay, every other
/// index is empty.
pub fn descriptor(index: usize) -> Option<&'static PluginDescriptor> {
    match index {
        0 => Some(&DESCRIPTOR),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Port indices are part of the hosting contract and must not move.
    #[test]
    fn test_port_indices_are_fixed() {
        let expected = [
            (0, Port::DelayLeft),
            (1, Port::DelayRight),
            (2, Port::DryWetLeft),
            (3, Port::DryWetRight),
            (4, Port::InputLeft),
            (5, Port::InputRight),
            (6, Port::OutputLeft),
            (7, Port::OutputRight),
        ];
        for (index, port) in expected {
            assert_eq!(port.index(), index);
            assert_eq!(Port::from_index(index), Some(port));
        }
        assert_eq!(Port::from_index(PORT_COUNT), None);
    }

    #[test]
    fn test_port_kinds_and_directions() {
        for port in Port::ALL {
            let desc = port.descriptor();
            let (direction, kind) = match port.index() {
                0..=3 => (PortDirection::Input, PortKind::Control),
                4 | 5 => (PortDirection::Input, PortKind::Audio),
                _ => (PortDirection::Output, PortKind::Audio),
            };
            assert_eq!(desc.direction, direction, "{port:?}");
            assert_eq!(desc.kind, kind, "{port:?}");
            assert_eq!(desc.hint.is_some(), kind == PortKind::Control, "{port:?}");
        }
    }

    /// Delay ports default to one second, dry/wet ports to an even blend.
    #[test]
    fn test_control_defaults_and_ranges() {
        for port in [Port::DelayLeft, Port::DelayRight] {
            let hint = port.descriptor().hint.unwrap();
            assert_eq!((hint.lower, hint.upper), (0.0, 5.0));
            assert_eq!(hint.default_value(), 1.0);
        }
        for port in [Port::DryWetLeft, Port::DryWetRight] {
            let hint = port.descriptor().hint.unwrap();
            assert_eq!((hint.lower, hint.upper), (0.0, 1.0));
            assert_eq!(hint.default_value(), 0.5);
        }
        assert_eq!(Port::InputLeft.descriptor().default_value(), None);
    }

    #[test]
    fn test_descriptor_lookup() {
        let desc = descriptor(0).expect("index 0 must resolve");
        assert_eq!(desc.unique_id, 399);
        assert_eq!(desc.ports.len(), PORT_COUNT);
        assert!(desc.hard_rt_capable);
        assert!(descriptor(1).is_none());
    }
}
