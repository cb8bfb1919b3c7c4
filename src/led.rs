//! LED output abstraction.
//!
//! The board carries a fixed set of four single-color LEDs. Patterns address
//! them either one channel at a time or all at once through a bitmask where
//! bit *i* controls channel *i*.

/// Number of LED channels on the board.
pub const CHANNEL_COUNT: usize = 4;

/// Bitmask with every channel set.
pub const ALL_CHANNELS: u8 = (1 << CHANNEL_COUNT) - 1;

/// One LED output channel.
///
/// Discriminants are the bit positions used by [`LedSink::set_mask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Green LED, bit 0.
    Green = 0,
    /// Orange LED, bit 1.
    Orange = 1,
    /// Red LED, bit 2.
    Red = 2,
    /// Blue LED, bit 3.
    Blue = 3,
}

impl Channel {
    /// All channels in index order. This is also the clockwise ring order.
    pub const ALL: [Channel; CHANNEL_COUNT] =
        [Channel::Green, Channel::Orange, Channel::Red, Channel::Blue];

    /// Returns the channel at `index`, or `None` if out of range.
    pub const fn from_index(index: usize) -> Option<Channel> {
        if index < CHANNEL_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Bit position of this channel.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-bit mask selecting this channel.
    #[inline]
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// Trait for abstracting the LED output driver.
///
/// Implementors only need [`set`](LedSink::set) and [`is_on`](LedSink::is_on);
/// the remaining operations are derived. Override
/// [`set_mask`](LedSink::set_mask) when the hardware can update every channel
/// in a single register write, which avoids intermediate frames.
pub trait LedSink {
    /// Sets a single channel on or off.
    fn set(&mut self, channel: Channel, on: bool);

    /// Returns whether a channel is currently lit.
    fn is_on(&self, channel: Channel) -> bool;

    /// Turns a channel on.
    fn on(&mut self, channel: Channel) {
        self.set(channel, true);
    }

    /// Turns a channel off.
    fn off(&mut self, channel: Channel) {
        self.set(channel, false);
    }

    /// Inverts a channel.
    fn toggle(&mut self, channel: Channel) {
        let lit = self.is_on(channel);
        self.set(channel, !lit);
    }

    /// Sets every channel to the same state.
    fn set_all(&mut self, on: bool) {
        self.set_mask(if on { ALL_CHANNELS } else { 0 });
    }

    /// Inverts every channel.
    fn toggle_all(&mut self) {
        let inverted = !self.mask() & ALL_CHANNELS;
        self.set_mask(inverted);
    }

    /// Sets all channels at once; bit *i* controls channel *i*.
    ///
    /// Bits above [`CHANNEL_COUNT`] are ignored.
    fn set_mask(&mut self, mask: u8) {
        for channel in Channel::ALL {
            self.set(channel, mask & channel.mask() != 0);
        }
    }

    /// Returns the lit channels as a bitmask.
    fn mask(&self) -> u8 {
        Channel::ALL
            .iter()
            .filter(|channel| self.is_on(**channel))
            .fold(0, |mask, channel| mask | channel.mask())
    }
}

impl<L: LedSink + ?Sized> LedSink for &mut L {
    fn set(&mut self, channel: Channel, on: bool) {
        (**self).set(channel, on)
    }

    fn is_on(&self, channel: Channel) -> bool {
        (**self).is_on(channel)
    }

    fn on(&mut self, channel: Channel) {
        (**self).on(channel)
    }

    fn off(&mut self, channel: Channel) {
        (**self).off(channel)
    }

    fn toggle(&mut self, channel: Channel) {
        (**self).toggle(channel)
    }

    fn set_all(&mut self, on: bool) {
        (**self).set_all(on)
    }

    fn toggle_all(&mut self) {
        (**self).toggle_all()
    }

    fn set_mask(&mut self, mask: u8) {
        (**self).set_mask(mask)
    }

    fn mask(&self) -> u8 {
        (**self).mask()
    }
}
