//! Per-child phase fan-out for staggered reveals.

/// Derive the phase-shifted progress of child `index` from the raw
/// container progress.
///
/// Child `index` starts once the container progress passes `index * step`
/// and still reaches 1.0 when the container does:
/// `clamp((progress - index*step) / (1 - index*step))`. The scheduler
/// never applies this itself; callers fan the container progress out with
/// whatever convention suits them.
pub fn staggered_progress(progress: f32, index: usize, step: f32) -> f32 {
    let delay = index as f32 * step;
    let span = 1.0 - delay;
    if span <= f32::EPSILON {
        return if progress >= delay { 1.0 } else { 0.0 };
    }
    ((progress - delay) / span).clamp(0.0, 1.0)
}
