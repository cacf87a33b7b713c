use std::num::NonZeroUsize;

/// The channel layout of a [crate::Signal].
///
/// Scene rendering only ever deals in mono recordings and binaural pairs, so unlike a general purpose mixer there is
/// no raw multichannel case.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, derive_more::IsVariant, derive_more::Display)]
pub enum ChannelFormat {
    /// Single-channel audio.
    #[display(fmt = "mono")]
    Mono,

    /// Two channels `[l r]`.
    #[display(fmt = "stereo")]
    Stereo,
}

impl ChannelFormat {
    pub fn get_channel_count(&self) -> NonZeroUsize {
        match self {
            ChannelFormat::Mono => NonZeroUsize::new(1).unwrap(),
            ChannelFormat::Stereo => NonZeroUsize::new(2).unwrap(),
        }
    }

    /// Map a channel count as found in a file header to a format, if we support it.
    pub fn from_channel_count(channels: usize) -> Option<ChannelFormat> {
        match channels {
            1 => Some(ChannelFormat::Mono),
            2 => Some(ChannelFormat::Stereo),
            _ => None,
        }
    }
}
