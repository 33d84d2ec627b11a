//! Spatial mix parameters
//!
//! Computes what the positional-audio library applies to a source before
//! mixing: inverse-distance-clamped attenuation, directional cone gain and
//! Doppler pitch shift. Nothing here touches sample data.

use super::types::{ListenerProperty, MixParams, SourceProperty, Vec3};

/// Speed of sound in units per second
pub const SPEED_OF_SOUND: f32 = 343.3;

/// Doppler exaggeration factor (1.0 = physical)
pub const DOPPLER_FACTOR: f32 = 1.0;

/// Listener state as the library tracks it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub at: Vec3,
    pub up: Vec3,
    pub gain: f32,
}

impl Default for ListenerState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            at: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            gain: 1.0,
        }
    }
}

impl ListenerState {
    pub fn apply(&mut self, prop: ListenerProperty) {
        match prop {
            ListenerProperty::Position(v) => self.position = v,
            ListenerProperty::Velocity(v) => self.velocity = v,
            ListenerProperty::Orientation { at, up } => {
                self.at = at;
                self.up = up;
            }
            ListenerProperty::Gain(g) => self.gain = g,
        }
    }
}

/// Spatial attributes of one source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParams {
    pub position: Vec3,
    pub velocity: Vec3,
    pub direction: Vec3,
    pub gain: f32,
    pub pitch: f32,
    pub looping: bool,
    pub cone_inner_angle: f32,
    pub cone_outer_angle: f32,
    pub cone_outer_gain: f32,
    pub reference_distance: f32,
    pub rolloff_factor: f32,
    pub max_distance: f32,
}

impl Default for SourceParams {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            direction: Vec3::ZERO,
            gain: 1.0,
            pitch: 1.0,
            looping: false,
            cone_inner_angle: 360.0,
            cone_outer_angle: 360.0,
            cone_outer_gain: 0.0,
            reference_distance: 1.0,
            rolloff_factor: 1.0,
            max_distance: f32::MAX,
        }
    }
}

impl SourceParams {
    pub fn apply(&mut self, prop: SourceProperty) {
        match prop {
            SourceProperty::Position(v) => self.position = v,
            SourceProperty::Velocity(v) => self.velocity = v,
            SourceProperty::Direction(v) => self.direction = v,
            SourceProperty::Gain(g) => self.gain = g,
            SourceProperty::Pitch(p) => self.pitch = p,
            SourceProperty::Looping(l) => self.looping = l,
            SourceProperty::ConeInnerAngle(a) => self.cone_inner_angle = a,
            SourceProperty::ConeOuterAngle(a) => self.cone_outer_angle = a,
            SourceProperty::ConeOuterGain(g) => self.cone_outer_gain = g,
            SourceProperty::ReferenceDistance(d) => self.reference_distance = d,
            SourceProperty::RolloffFactor(r) => self.rolloff_factor = r,
            SourceProperty::MaxDistance(d) => self.max_distance = d,
        }
    }
}

/// Inverse-distance-clamped attenuation
pub fn distance_gain(distance: f32, reference: f32, rolloff: f32, max_distance: f32) -> f32 {
    if reference <= 0.0 {
        return 1.0;
    }
    let d = distance.max(reference).min(max_distance.max(reference));
    reference / (reference + rolloff * (d - reference))
}

/// Cone gain for a listener seen at `angle_deg` off the source axis
pub fn cone_gain(angle_deg: f32, inner_deg: f32, outer_deg: f32, outer_gain: f32) -> f32 {
    let inner = inner_deg / 2.0;
    let outer = (outer_deg / 2.0).max(inner);
    if angle_deg <= inner {
        1.0
    } else if angle_deg >= outer {
        outer_gain
    } else {
        let t = (angle_deg - inner) / (outer - inner);
        1.0 + (outer_gain - 1.0) * t
    }
}

/// Doppler pitch factor
///
/// Velocities are projected on the source→listener axis and clamped below
/// the speed of sound. Returns 1.0 when source and listener coincide.
pub fn doppler_factor(source_pos: Vec3, source_vel: Vec3, listener_pos: Vec3, listener_vel: Vec3) -> f32 {
    let sl = listener_pos - source_pos;
    let len = sl.length();
    if len <= f32::EPSILON {
        return 1.0;
    }
    let limit = SPEED_OF_SOUND / DOPPLER_FACTOR * 0.99;
    let v_listener = (sl.dot(listener_vel) / len).min(limit);
    let v_source = (sl.dot(source_vel) / len).min(limit);

    (SPEED_OF_SOUND - DOPPLER_FACTOR * v_listener) / (SPEED_OF_SOUND - DOPPLER_FACTOR * v_source)
}

/// Full mix parameters for `source` heard by `listener`
pub fn compute_mix(listener: &ListenerState, source: &SourceParams) -> MixParams {
    let to_listener = listener.position - source.position;
    let distance = to_listener.length();

    let distance_gain = distance_gain(
        distance,
        source.reference_distance,
        source.rolloff_factor,
        source.max_distance,
    );

    let axis = source.direction.normalize();
    let cone_gain = if axis == Vec3::ZERO || distance <= f32::EPSILON {
        1.0
    } else {
        let cos = axis.dot(to_listener.normalize()).clamp(-1.0, 1.0);
        cone_gain(
            cos.acos().to_degrees(),
            source.cone_inner_angle,
            source.cone_outer_angle,
            source.cone_outer_gain,
        )
    };

    let doppler = doppler_factor(
        source.position,
        source.velocity,
        listener.position,
        listener.velocity,
    );

    let gain = (source.gain * distance_gain * cone_gain).clamp(0.0, 1.0) * listener.gain;

    MixParams {
        distance,
        distance_gain,
        cone_gain,
        doppler,
        gain,
        pitch: source.pitch * doppler,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_distance_gain_clamped_inside_reference() {
        assert_eq!(distance_gain(0.2, 1.0, 1.0, f32::MAX), 1.0);
        assert!(approx(distance_gain(2.0, 1.0, 1.0, f32::MAX), 0.5));
        assert!(approx(distance_gain(8.0, 1.0, 1.0, f32::MAX), 0.125));
        // Beyond max distance attenuation stops
        assert!(approx(distance_gain(100.0, 1.0, 1.0, 4.0), 0.25));
        assert_eq!(distance_gain(5.0, 0.0, 1.0, f32::MAX), 1.0);
    }

    #[test]
    fn test_cone_gain_regions() {
        assert_eq!(cone_gain(10.0, 60.0, 180.0, 0.2), 1.0);
        assert_eq!(cone_gain(120.0, 60.0, 180.0, 0.2), 0.2);
        assert!(approx(cone_gain(60.0, 60.0, 180.0, 0.2), 0.6));
    }

    #[test]
    fn test_doppler_approaching_raises_pitch() {
        let listener = Vec3::ZERO;
        let source = Vec3::new(-10.0, 0.0, 0.0);
        let approaching = doppler_factor(source, Vec3::new(30.0, 0.0, 0.0), listener, Vec3::ZERO);
        let receding = doppler_factor(source, Vec3::new(-30.0, 0.0, 0.0), listener, Vec3::ZERO);
        assert!(approaching > 1.0);
        assert!(receding < 1.0);
        assert!(approx(
            approaching,
            SPEED_OF_SOUND / (SPEED_OF_SOUND - 30.0)
        ));
    }

    #[test]
    fn test_doppler_coincident_is_neutral() {
        assert_eq!(
            doppler_factor(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, Vec3::ZERO),
            1.0
        );
    }

    #[test]
    fn test_compute_mix_static_source() {
        let listener = ListenerState::default();
        let source = SourceParams {
            position: Vec3::new(-8.0, 0.0, 0.0),
            ..SourceParams::default()
        };
        let mix = compute_mix(&listener, &source);
        assert!(approx(mix.distance, 8.0));
        assert!(approx(mix.gain, 0.125));
        assert_eq!(mix.cone_gain, 1.0);
        assert_eq!(mix.pitch, 1.0);
    }

    #[test]
    fn test_compute_mix_facing_away_uses_outer_gain() {
        let listener = ListenerState::default();
        let source = SourceParams {
            position: Vec3::new(0.0, 0.0, -1.0),
            // Pointing away from the listener
            direction: Vec3::new(0.0, 0.0, -1.0),
            cone_inner_angle: 30.0,
            cone_outer_angle: 90.0,
            cone_outer_gain: 0.1,
            ..SourceParams::default()
        };
        let mix = compute_mix(&listener, &source);
        assert!(approx(mix.cone_gain, 0.1));
        assert!(approx(mix.gain, 0.1));
    }
}
