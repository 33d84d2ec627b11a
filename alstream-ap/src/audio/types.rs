//! Core audio data types
//!
//! Buffer formats, 3D vectors and the listener/source property sets that
//! make up the audio library's configuration surface.

use crate::error::{Error, Result};
use alstream_common::WavHeader;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};
use std::time::Duration;

/// Channel layout of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    pub fn count(self) -> u16 {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

/// Sample width of integer PCM data
///
/// 8-bit samples are unsigned, 16-bit samples are signed little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleWidth {
    U8,
    I16,
}

impl SampleWidth {
    pub fn bits(self) -> u16 {
        match self {
            SampleWidth::U8 => 8,
            SampleWidth::I16 => 16,
        }
    }

    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }
}

/// Format metadata attached to every buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferFormat {
    pub channels: Channels,
    pub width: SampleWidth,
    pub sample_rate: u32,
}

impl BufferFormat {
    pub fn new(channels: Channels, width: SampleWidth, sample_rate: u32) -> Self {
        Self {
            channels,
            width,
            sample_rate,
        }
    }

    /// 16-bit mono at `sample_rate`
    pub fn mono16(sample_rate: u32) -> Self {
        Self::new(Channels::Mono, SampleWidth::I16, sample_rate)
    }

    /// 16-bit stereo at `sample_rate`
    pub fn stereo16(sample_rate: u32) -> Self {
        Self::new(Channels::Stereo, SampleWidth::I16, sample_rate)
    }

    /// Map a WAV header onto a buffer format
    ///
    /// Only mono/stereo 8/16-bit PCM is playable.
    pub fn from_wav_header(header: &WavHeader) -> Result<Self> {
        let channels = match header.num_channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            n => {
                return Err(Error::InvalidArgument(format!(
                    "unsupported channel count: {}",
                    n
                )))
            }
        };
        let width = match header.bits_per_sample {
            8 => SampleWidth::U8,
            16 => SampleWidth::I16,
            n => {
                return Err(Error::InvalidArgument(format!(
                    "unsupported bits per sample: {}",
                    n
                )))
            }
        };
        if header.sample_rate == 0 {
            return Err(Error::InvalidArgument("sample rate is zero".to_string()));
        }
        Ok(Self::new(channels, width, header.sample_rate))
    }

    /// Bytes in one frame (one sample per channel)
    pub fn bytes_per_frame(&self) -> usize {
        self.channels.count() as usize * self.width.bytes()
    }

    /// Whole frames held by `byte_len` bytes
    pub fn frames_in(&self, byte_len: usize) -> u64 {
        (byte_len / self.bytes_per_frame()) as u64
    }

    /// Bytes needed for `duration` of audio, rounded down to whole frames
    pub fn bytes_for(&self, duration: Duration) -> usize {
        let frames = (duration.as_secs_f64() * self.sample_rate as f64) as usize;
        frames * self.bytes_per_frame()
    }

    /// Playback duration of `byte_len` bytes at normal pitch
    pub fn duration_of(&self, byte_len: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames_in(byte_len) as f64 / self.sample_rate as f64)
    }

    /// Reject a zero sample rate and data that is not a whole number of frames
    pub fn check_len(&self, byte_len: usize) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidArgument("sample rate is zero".to_string()));
        }
        if byte_len % self.bytes_per_frame() != 0 {
            return Err(Error::InvalidArgument(format!(
                "{} bytes is not a whole number of {}-byte frames",
                byte_len,
                self.bytes_per_frame()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for BufferFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ch = match self.channels {
            Channels::Mono => "mono",
            Channels::Stereo => "stereo",
        };
        write!(f, "{}{} @ {} Hz", ch, self.width.bits(), self.sample_rate)
    }
}

/// 3D vector in listener-space units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector, or zero for a zero-length input
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vec3::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Listener attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListenerProperty {
    Position(Vec3),
    Velocity(Vec3),
    /// "At" and "up" vectors
    Orientation { at: Vec3, up: Vec3 },
    Gain(f32),
}

impl ListenerProperty {
    /// Reject non-finite vectors and negative gain
    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            ListenerProperty::Position(v) | ListenerProperty::Velocity(v) => v.is_finite(),
            ListenerProperty::Orientation { at, up } => {
                at.is_finite() && up.is_finite() && at.length() > 0.0 && up.length() > 0.0
            }
            ListenerProperty::Gain(g) => g.is_finite() && g >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!("invalid listener value: {:?}", self)))
        }
    }
}

/// Source attributes
///
/// Cone angles are full apertures in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceProperty {
    Position(Vec3),
    Velocity(Vec3),
    /// Zero vector means omnidirectional
    Direction(Vec3),
    Gain(f32),
    Pitch(f32),
    Looping(bool),
    ConeInnerAngle(f32),
    ConeOuterAngle(f32),
    ConeOuterGain(f32),
    ReferenceDistance(f32),
    RolloffFactor(f32),
    MaxDistance(f32),
}

impl SourceProperty {
    /// Check the value against the range the library accepts
    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            SourceProperty::Position(v)
            | SourceProperty::Velocity(v)
            | SourceProperty::Direction(v) => v.is_finite(),
            SourceProperty::Gain(g) => g.is_finite() && g >= 0.0,
            SourceProperty::Pitch(p) => p.is_finite() && p > 0.0,
            SourceProperty::Looping(_) => true,
            SourceProperty::ConeInnerAngle(a) | SourceProperty::ConeOuterAngle(a) => {
                (0.0..=360.0).contains(&a)
            }
            SourceProperty::ConeOuterGain(g) => (0.0..=1.0).contains(&g),
            SourceProperty::ReferenceDistance(d)
            | SourceProperty::RolloffFactor(d)
            | SourceProperty::MaxDistance(d) => d.is_finite() && d >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!("invalid source value: {:?}", self)))
        }
    }
}

/// Effective parameters the library applies to a source
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MixParams {
    /// Listener-to-source distance
    pub distance: f32,
    pub distance_gain: f32,
    pub cone_gain: f32,
    /// Doppler pitch factor (1.0 = no shift)
    pub doppler: f32,
    /// Final gain after clamping and listener gain
    pub gain: f32,
    /// Final pitch multiplier (source pitch × Doppler)
    pub pitch: f32,
}
