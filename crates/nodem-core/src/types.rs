//! Closed value sets shared across nodem.
//!
//! Every small enumerated setting of the emulated modem is a Rust enum so
//! that each use site matches exhaustively instead of comparing integers.

use std::fmt;

/// Whether a session interprets incoming bytes as commands or as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelState {
    /// Bytes are accumulated into AT command lines.
    #[default]
    Command,
    /// Bytes are relayed as data; no command processing happens.
    OnLine,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Command => write!(f, "command"),
            ChannelState::OnLine => write!(f, "on-line"),
        }
    }
}

/// Speaker volume (`ATL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Volume {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volume::Low => write!(f, "low"),
            Volume::Medium => write!(f, "medium"),
            Volume::High => write!(f, "high"),
        }
    }
}

/// Speaker control (`ATM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpeakerMode {
    /// `M0`
    AlwaysOff,
    /// `M1`
    OnUntilCarrierDetect,
    /// `M2`
    AlwaysOn,
    /// `M3`
    #[default]
    OnAfterDiallingUntilCarrierDetect,
}

impl fmt::Display for SpeakerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakerMode::AlwaysOff => write!(f, "always off"),
            SpeakerMode::OnUntilCarrierDetect => write!(f, "on until carrier detect"),
            SpeakerMode::AlwaysOn => write!(f, "always on"),
            SpeakerMode::OnAfterDiallingUntilCarrierDetect => {
                write!(f, "on after dialling until carrier detect")
            }
        }
    }
}
