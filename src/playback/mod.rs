//! The per-session playback context state machine.
//!
//! The context is a pure value: operations mutate an owned copy and the
//! caller persists it between requests. Storage reads (queue, catalog) only
//! happen when the caller seeds a fresh context.

mod context_store;

pub use context_store::PlaybackContextStore;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub type SongId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackContext {
    songs: Vec<SongId>,
    current_index: usize,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl PlaybackContext {
    /// Builds a context positioned at the first track. An empty seed means
    /// there is nothing to play and no context is created.
    pub fn from_seed(song_ids: Vec<SongId>) -> Option<Self> {
        if song_ids.is_empty() {
            return None;
        }
        Some(PlaybackContext {
            songs: song_ids,
            current_index: 0,
            shuffle: false,
            repeat: RepeatMode::Off,
        })
    }

    /// The track at the current position.
    pub fn current(&self) -> SongId {
        self.songs[self.current_index]
    }

    pub fn songs(&self) -> &[SongId] {
        &self.songs
    }

    /// Ensures `song_id` is in the sequence (append-if-absent) and moves the
    /// position onto it.
    pub fn play(&mut self, song_id: SongId) {
        let index = match self.songs.iter().position(|id| *id == song_id) {
            Some(index) => index,
            None => {
                self.songs.push(song_id);
                self.songs.len() - 1
            }
        };
        self.current_index = index;
    }

    /// Advances to the next track, wrapping to the start at the end of the
    /// sequence. With `repeat == One` the current track is replayed; with
    /// shuffle on, a random other track is picked instead.
    pub fn next<R: Rng>(&mut self, rng: &mut R) {
        if self.repeat == RepeatMode::One {
            return;
        }
        if self.shuffle {
            self.current_index = self.random_other_index(rng);
            return;
        }
        if self.current_index + 1 < self.songs.len() {
            self.current_index += 1;
        } else {
            self.current_index = 0;
        }
    }

    /// Steps back to the previous track, wrapping to the end at the start of
    /// the sequence. With `repeat == One` the current track is replayed.
    pub fn previous<R: Rng>(&mut self, rng: &mut R) {
        if self.repeat == RepeatMode::One {
            return;
        }
        if self.shuffle {
            self.current_index = self.random_other_index(rng);
            return;
        }
        if self.current_index > 0 {
            self.current_index -= 1;
        } else {
            self.current_index = self.songs.len() - 1;
        }
    }

    /// Merges the provided settings over the existing ones.
    pub fn update_settings(&mut self, shuffle: Option<bool>, repeat: Option<RepeatMode>) {
        if let Some(shuffle) = shuffle {
            self.shuffle = shuffle;
        }
        if let Some(repeat) = repeat {
            self.repeat = repeat;
        }
    }

    fn random_other_index<R: Rng>(&self, rng: &mut R) -> usize {
        if self.songs.len() < 2 {
            return self.current_index;
        }
        // Pick among the other positions so shuffle always moves somewhere.
        let offset = rng.random_range(1..self.songs.len());
        (self.current_index + offset) % self.songs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn empty_seed_yields_no_context() {
        assert!(PlaybackContext::from_seed(vec![]).is_none());
    }

    #[test]
    fn seeded_context_starts_at_first_track() {
        let ctx = PlaybackContext::from_seed(vec![1, 2, 3]).unwrap();
        assert_eq!(ctx.current(), 1);
    }

    #[test]
    fn next_wraps_to_start() {
        let mut ctx = PlaybackContext::from_seed(vec![1, 2, 3]).unwrap();
        let mut rng = rng();
        ctx.next(&mut rng);
        assert_eq!(ctx.current(), 2);
        ctx.next(&mut rng);
        assert_eq!(ctx.current(), 3);
        ctx.next(&mut rng);
        assert_eq!(ctx.current(), 1);
    }

    #[test]
    fn previous_wraps_to_end() {
        let mut ctx = PlaybackContext::from_seed(vec![5, 9, 2]).unwrap();
        let mut rng = rng();
        ctx.play(2);
        assert_eq!(ctx.current(), 2);
        ctx.previous(&mut rng);
        assert_eq!(ctx.current(), 9);
        ctx.previous(&mut rng);
        assert_eq!(ctx.current(), 5);
        ctx.previous(&mut rng);
        assert_eq!(ctx.current(), 2);
    }

    #[test]
    fn play_appends_unknown_song_once() {
        let mut ctx = PlaybackContext::from_seed(vec![1, 2]).unwrap();
        ctx.play(3);
        assert_eq!(ctx.current(), 3);
        assert_eq!(ctx.songs(), &[1, 2, 3]);

        ctx.play(3);
        assert_eq!(ctx.current(), 3);
        assert_eq!(ctx.songs(), &[1, 2, 3]);
    }

    #[test]
    fn play_jumps_to_existing_song() {
        let mut ctx = PlaybackContext::from_seed(vec![4, 8, 6]).unwrap();
        ctx.play(8);
        assert_eq!(ctx.current(), 8);
        assert_eq!(ctx.songs().len(), 3);
    }

    #[test]
    fn repeat_one_replays_current_track() {
        let mut ctx = PlaybackContext::from_seed(vec![1, 2, 3]).unwrap();
        ctx.update_settings(None, Some(RepeatMode::One));
        let mut rng = rng();
        ctx.next(&mut rng);
        assert_eq!(ctx.current(), 1);
        ctx.previous(&mut rng);
        assert_eq!(ctx.current(), 1);
    }

    #[test]
    fn shuffle_moves_to_another_valid_index() {
        let mut ctx = PlaybackContext::from_seed(vec![1, 2, 3, 4]).unwrap();
        ctx.update_settings(Some(true), None);
        let mut rng = rng();
        for _ in 0..20 {
            let before = ctx.current();
            ctx.next(&mut rng);
            assert_ne!(ctx.current(), before);
            assert!(ctx.songs().contains(&ctx.current()));
        }
    }

    #[test]
    fn shuffle_on_single_track_stays_put() {
        let mut ctx = PlaybackContext::from_seed(vec![42]).unwrap();
        ctx.update_settings(Some(true), None);
        let mut rng = rng();
        ctx.next(&mut rng);
        assert_eq!(ctx.current(), 42);
    }

    #[test]
    fn settings_merge_preserves_unset_fields() {
        let mut ctx = PlaybackContext::from_seed(vec![1]).unwrap();
        ctx.update_settings(Some(true), None);
        assert!(ctx.shuffle);
        assert_eq!(ctx.repeat, RepeatMode::Off);

        ctx.update_settings(None, Some(RepeatMode::All));
        assert!(ctx.shuffle);
        assert_eq!(ctx.repeat, RepeatMode::All);
    }
}
