use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// What the global audio bar is playing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioTrack {
    pub title: String,
    pub audio_url: String,
    pub image_url: String,
    pub author: String,
    pub podcast_id: i64,
}

/// Shared now-playing slot. Cloning gives another handle to the same slot.
#[derive(Clone)]
pub struct AudioPlayer {
    current: Arc<watch::Sender<Option<AudioTrack>>>,
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlayer {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current: Arc::new(current),
        }
    }

    pub fn play(&self, track: AudioTrack) {
        log::info!("Now playing podcast {}: {}", track.podcast_id, track.title);
        self.current.send_replace(Some(track));
    }

    pub fn stop(&self) {
        if self.current.send_replace(None).is_some() {
            log::debug!("Playback stopped");
        }
    }

    pub fn now_playing(&self) -> Option<AudioTrack> {
        self.current.borrow().clone()
    }

    pub fn is_playing(&self, podcast_id: i64) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|t| t.podcast_id == podcast_id)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AudioTrack>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(podcast_id: i64) -> AudioTrack {
        AudioTrack {
            title: format!("Episode {}", podcast_id),
            audio_url: format!("https://cdn.example.com/{}.mp3", podcast_id),
            image_url: String::new(),
            author: "Mara".to_string(),
            podcast_id,
        }
    }

    #[test]
    fn test_only_one_track_plays_across_handles() {
        let player = AudioPlayer::new();
        let other_view = player.clone();

        player.play(track(1));
        assert!(other_view.is_playing(1));

        other_view.play(track(2));
        assert!(!player.is_playing(1));
        assert!(player.is_playing(2));

        player.stop();
        assert_eq!(other_view.now_playing(), None);
    }
}
