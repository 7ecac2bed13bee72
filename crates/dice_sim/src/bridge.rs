//! Boundaries between the simulated board and the host's video and audio.
//!
//! The `VIDEO` and `AUDIO` chips forward their input levels to a
//! [`VideoBridge`] and an [`AudioBridge`]. Presentation back-ends implement
//! these traits; the headless implementations here are enough for batch
//! runs, trace recording and tests.

use crate::desc::{AudioDesc, VideoDesc};
use crate::time::SimTime;
use std::any::Any;

/// `VIDEO` input pin carrying horizontal blanking.
pub const HBLANK_PIN: u8 = 9;
/// `VIDEO` input pin carrying vertical blanking.
pub const VBLANK_PIN: u8 = 10;
/// Input pins of the `VIDEO` chip, in bitmask order.
pub const VIDEO_INPUT_PINS: &[u8] = &[1, 2, 3, 4, 5, 6, 7, 8, HBLANK_PIN, VBLANK_PIN];
/// Input pins of the `AUDIO` chip, in bitmask order.
pub const AUDIO_INPUT_PINS: &[u8] = &[1, 2, 3, 4];

/// Level of `pin` in a `VIDEO` input bitmask.
pub fn video_pin(inputs: u32, pin: u8) -> bool {
    VIDEO_INPUT_PINS
        .iter()
        .position(|&p| p == pin)
        .is_some_and(|bit| inputs & (1 << bit) != 0)
}

/// Fraction of `AUDIO` input pins that are high, in `0.0..=1.0`.
pub fn audio_mix(inputs: u32) -> f64 {
    let high = (inputs & ((1 << AUDIO_INPUT_PINS.len()) - 1)).count_ones();
    f64::from(high) / AUDIO_INPUT_PINS.len() as f64
}

/// Receives the board's video signals.
pub trait VideoBridge: Send {
    /// Called once before the circuit starts.
    fn configure(&mut self, desc: &VideoDesc);

    /// Number of completed frames; the frame-edge recorder polls this.
    fn frame_count(&self) -> u32;

    /// Delivers the `VIDEO` chip's input bitmask at `time`.
    fn signal(&mut self, time: SimTime, inputs: u32);

    /// Access to the concrete back-end.
    fn as_any(&self) -> &dyn Any;
}

/// Receives the board's audio signals.
pub trait AudioBridge: Send {
    /// Called once before the circuit starts, if the board has audio.
    fn configure(&mut self, desc: &AudioDesc);

    /// Delivers the `AUDIO` chip's input bitmask at `time`.
    fn signal(&mut self, time: SimTime, inputs: u32);

    /// Access to the concrete back-end.
    fn as_any(&self) -> &dyn Any;
}

/// Video back-end that only keeps time: counts lines and frames.
#[derive(Debug, Default)]
pub struct HeadlessVideo {
    desc: VideoDesc,
    last_inputs: u32,
    frames: u32,
    lines: u32,
    lines_in_last_frame: u32,
    last_frame_start: Option<SimTime>,
    last_frame_period: Option<u64>,
}

impl HeadlessVideo {
    /// Creates a back-end with no frames counted.
    pub fn new() -> Self {
        Self::default()
    }

    /// The description passed to [`VideoBridge::configure`].
    pub fn desc(&self) -> &VideoDesc {
        &self.desc
    }

    /// Scanlines counted in the most recent complete frame.
    pub fn lines_in_last_frame(&self) -> u32 {
        self.lines_in_last_frame
    }

    /// Picoseconds between the last two frame starts.
    pub fn last_frame_period_ps(&self) -> Option<u64> {
        self.last_frame_period
    }
}

impl VideoBridge for HeadlessVideo {
    fn configure(&mut self, desc: &VideoDesc) {
        self.desc = desc.clone();
    }

    fn frame_count(&self) -> u32 {
        self.frames
    }

    fn signal(&mut self, time: SimTime, inputs: u32) {
        let rising = |pin| video_pin(inputs, pin) && !video_pin(self.last_inputs, pin);
        if rising(HBLANK_PIN) {
            self.lines += 1;
        }
        if rising(VBLANK_PIN) {
            self.frames = self.frames.wrapping_add(1);
            self.lines_in_last_frame = std::mem::take(&mut self.lines);
            if let Some(start) = self.last_frame_start {
                self.last_frame_period = Some(time.since(start));
            }
            self.last_frame_start = Some(time);
        }
        self.last_inputs = inputs;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Audio back-end that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioBridge for NullAudio {
    fn configure(&mut self, _desc: &AudioDesc) {}

    fn signal(&mut self, _time: SimTime, _inputs: u32) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One mixed audio level change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioSample {
    /// When the level changed.
    pub time: SimTime,
    /// Mixed level in `0.0..=gain`.
    pub level: f64,
}

/// Audio back-end that mixes the `AUDIO` inputs and buffers the level changes.
#[derive(Debug)]
pub struct AudioBuffer {
    gain: f64,
    samples: Vec<AudioSample>,
}

impl AudioBuffer {
    /// Creates an empty buffer with unit gain.
    pub fn new() -> Self {
        Self {
            gain: 1.0,
            samples: Vec::new(),
        }
    }

    /// Buffered samples, oldest first.
    pub fn samples(&self) -> &[AudioSample] {
        &self.samples
    }

    /// Removes and returns the buffered samples.
    pub fn drain(&mut self) -> Vec<AudioSample> {
        std::mem::take(&mut self.samples)
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBridge for AudioBuffer {
    fn configure(&mut self, desc: &AudioDesc) {
        self.gain = desc.gain;
    }

    fn signal(&mut self, time: SimTime, inputs: u32) {
        let level = self.gain * audio_mix(inputs);
        if self.samples.last().map(|s| s.level) != Some(level) {
            self.samples.push(AudioSample { time, level });
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(pins: &[u8]) -> u32 {
        pins.iter()
            .map(|&p| 1u32 << VIDEO_INPUT_PINS.iter().position(|&q| q == p).unwrap())
            .sum()
    }

    #[test]
    fn video_pin_lookup() {
        let inputs = bits(&[HBLANK_PIN]);
        assert!(video_pin(inputs, HBLANK_PIN));
        assert!(!video_pin(inputs, VBLANK_PIN));
        assert!(!video_pin(u32::MAX, 42));
    }

    #[test]
    fn headless_counts_lines_and_frames() {
        let mut v = HeadlessVideo::new();
        v.configure(&VideoDesc::default());
        let mut t = 0;
        for frame in 0..2 {
            for _ in 0..3 {
                t += 10;
                v.signal(SimTime::from_ps(t), bits(&[HBLANK_PIN]));
                t += 10;
                v.signal(SimTime::from_ps(t), 0);
            }
            t += 10;
            v.signal(SimTime::from_ps(t), bits(&[VBLANK_PIN]));
            assert_eq!(v.frame_count(), frame + 1);
            // holding VBLANK high is not a new frame
            v.signal(SimTime::from_ps(t + 1), bits(&[VBLANK_PIN]));
            t += 10;
            v.signal(SimTime::from_ps(t), 0);
        }
        assert_eq!(v.frame_count(), 2);
        assert_eq!(v.lines_in_last_frame(), 3);
        assert_eq!(v.last_frame_period_ps(), Some(80));
    }

    #[test]
    fn audio_mix_ignores_extra_bits() {
        assert_eq!(audio_mix(0), 0.0);
        assert_eq!(audio_mix(0b0110), 0.5);
        assert_eq!(audio_mix(0b1_1111), 1.0);
    }

    #[test]
    fn audio_buffer_mixes_and_dedups() {
        let mut a = AudioBuffer::new();
        a.configure(&AudioDesc { gain: 2.0 });
        a.signal(SimTime::from_ps(1), 0b0001);
        a.signal(SimTime::from_ps(2), 0b0001);
        a.signal(SimTime::from_ps(3), 0b1111);
        let levels: Vec<f64> = a.samples().iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![0.5, 2.0]);
        assert_eq!(a.drain().len(), 2);
        assert!(a.samples().is_empty());
    }
}
