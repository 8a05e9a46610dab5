//! Cooperative tick driver.
//!
//! Runs on the caller's task: every tick re-reads the wall clock (or the
//! attached audio source) and feeds it into the session. Dropping the
//! future cancels playback immediately; nothing keeps running afterwards.

use tokio::time::{Instant, MissedTickBehavior};

use crate::core::audio::AudioSource;
use crate::core::listener::PlaybackListener;
use crate::core::playback::TickOutcome;
use crate::core::session::TimelineSession;

/// Drive `session` until playback stops. Returns the last tick outcome.
///
/// With an audio source attached and sync enabled, the audio position
/// drives the shot timeline and playback ends when the audio does.
pub async fn run_until_stopped(
    session: &mut TimelineSession,
    mut audio: Option<&mut dyn AudioSource>,
    listener: &mut dyn PlaybackListener,
) -> TickOutcome {
    let mut interval = tokio::time::interval(session.settings().playback.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = TickOutcome::Idle;

    while session.is_playing() {
        interval.tick().await;
        let now = Instant::now().into_std();

        if let Some(source) = audio.as_deref_mut() {
            if let Some(duration) = source.duration() {
                if duration != session.clock().audio_duration {
                    session.attach_audio(duration);
                }
            }
            if session.clock().sync_enabled && session.clock().has_audio() {
                session.on_audio_time_update(source.current_time(), now, listener);
                if source.is_ended() {
                    session.stop(now);
                    last = TickOutcome::Finished;
                    break;
                }
                continue;
            }
        }

        last = session.tick(now, listener);
    }

    tracing::debug!(outcome = ?last, "tick loop exited");
    last
}
