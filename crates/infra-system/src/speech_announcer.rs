// Speech announcer: text-to-speech through an external engine subprocess
// reason: tokio::process for async spawn, kill_on_drop for cancellation
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use antrean_core::domain::AnnouncementScript;
use antrean_core::error::{AppError, Result};
use antrean_core::port::Announcer;

/// Default speech engine binary
pub const DEFAULT_SPEECH_PROGRAM: &str = "espeak-ng";

/// Engine speaking rate at `rate = 1.0` (words per minute)
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// Speech settings
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Engine binary (espeak-ng compatible command line)
    pub program: String,
    /// Upper bound for a single utterance
    pub timeout: Duration,
    /// Voice languages to try before the script's own preference order
    pub voices: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_SPEECH_PROGRAM.to_string(),
            timeout: Duration::from_secs(30),
            voices: Vec::new(),
        }
    }
}

/// Announcer speaking through `espeak-ng` (or a compatible engine)
///
/// A new announcement cuts off one still being spoken.
pub struct SpeechAnnouncer {
    config: SpeechConfig,
    voice: OnceCell<Option<String>>,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl SpeechAnnouncer {
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            voice: OnceCell::new(),
            current: Mutex::new(None),
        }
    }

    /// Ask the engine which voice languages it has
    async fn available_languages(&self) -> Vec<String> {
        let output = Command::new(&self.config.program)
            .arg("--voices")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                parse_voice_languages(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                debug!(status = ?output.status, "Voice listing failed");
                Vec::new()
            }
            Err(e) => {
                debug!(error = %e, "Voice listing unavailable");
                Vec::new()
            }
        }
    }

    /// Resolved once, then cached for the lifetime of the announcer
    async fn voice_for(&self, script: &AnnouncementScript) -> Option<String> {
        self.voice
            .get_or_init(|| async {
                let available = self.available_languages().await;
                let preference: Vec<String> = self
                    .config
                    .voices
                    .iter()
                    .chain(script.language_preference.iter())
                    .cloned()
                    .collect();
                let picked = pick_voice(&preference, &available);
                info!(voice = ?picked, available = available.len(), "Speech voice selected");
                picked
            })
            .await
            .clone()
    }

    /// Wait for the utterance in progress (if any) to end
    ///
    /// Short-lived processes call this before exiting; otherwise the
    /// runtime shutdown cuts the speech off.
    pub async fn finish(&self) {
        let current = self.current.lock().unwrap().take();
        if let Some(handle) = current {
            let _ = handle.await;
        }
    }

    fn cancel_current(&self) {
        if let Some(previous) = self.current.lock().unwrap().take() {
            if !previous.is_finished() {
                debug!("Cancelling previous announcement");
            }
            previous.abort();
        }
    }
}

#[async_trait]
impl Announcer for SpeechAnnouncer {
    async fn announce(&self, script: &AnnouncementScript) -> Result<()> {
        self.cancel_current();

        let voice = self.voice_for(script).await;
        let args = build_args(script, voice.as_deref());

        let mut child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::Announcement(format!("failed to start {}: {}", self.config.program, e))
            })?;

        info!(program = %self.config.program, voice = ?voice, "Speaking announcement");

        let limit = self.config.timeout;
        let handle = tokio::spawn(async move {
            match timeout(limit, child.wait()).await {
                Ok(Ok(status)) if status.success() => debug!("Announcement finished"),
                Ok(Ok(status)) => warn!(?status, "Speech engine exited with failure"),
                Ok(Err(e)) => warn!(error = %e, "Waiting for speech engine failed"),
                Err(_) => warn!(timeout_ms = limit.as_millis() as u64, "Announcement timed out"),
            }
        });

        *self.current.lock().unwrap() = Some(handle);
        Ok(())
    }
}

/// Languages listed by `espeak-ng --voices` (second column, header skipped)
fn parse_voice_languages(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(|lang| lang.to_string())
        .collect()
}

/// First preferred language the engine has
///
/// A preference matches an exact tag (`pt-BR` ~ `pt-br`) or, failing that,
/// its primary subtag (`id-ID` ~ `id`). `None` leaves the engine default.
fn pick_voice(preference: &[String], available: &[String]) -> Option<String> {
    for wanted in preference {
        if let Some(found) = available.iter().find(|a| a.eq_ignore_ascii_case(wanted)) {
            return Some(found.clone());
        }
        let primary = wanted.split('-').next().unwrap_or(wanted);
        if let Some(found) = available.iter().find(|a| a.eq_ignore_ascii_case(primary)) {
            return Some(found.clone());
        }
    }
    None
}

/// Map script parameters onto espeak-ng flags
fn build_args(script: &AnnouncementScript, voice: Option<&str>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(voice) = voice {
        args.push("-v".to_string());
        args.push(voice.to_string());
    }
    let speed = (BASE_WORDS_PER_MINUTE * script.rate).round() as i32;
    let pitch = (50.0 * script.pitch).round().clamp(0.0, 99.0) as i32;
    let amplitude = (100.0 * script.volume).round().clamp(0.0, 200.0) as i32;
    args.extend([
        "-s".to_string(),
        speed.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        script.sentence.clone(),
    ]);
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use antrean_core::domain::{EntryId, NewEntry};

    fn script() -> AnnouncementScript {
        let entry = NewEntry::new("Ana", "Yamaha", "AB 1")
            .unwrap()
            .into_entry(EntryId::new("e-1"));
        AnnouncementScript::for_entry(&entry, "kaibete motor")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_voice_languages() {
        let listing = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
                        5  af              --/M      Afrikaans          gmw/af\n \
                        5  id              --/M      Indonesian         poz/id\n \
                        5  pt-br           --/M      Portuguese_(Brazil) roa/pt-BR\n";
        assert_eq!(parse_voice_languages(listing), strings(&["af", "id", "pt-br"]));
    }

    #[test]
    fn test_pick_voice_follows_preference_order() {
        let available = strings(&["en-us", "pt-br", "id"]);
        let preference = strings(&["id-ID", "pt-BR", "en-US"]);
        assert_eq!(pick_voice(&preference, &available).as_deref(), Some("id"));

        let available = strings(&["en-us", "pt-br"]);
        assert_eq!(pick_voice(&preference, &available).as_deref(), Some("pt-br"));

        assert_eq!(pick_voice(&preference, &strings(&["de"])), None);
    }

    #[test]
    fn test_build_args() {
        let args = build_args(&script(), Some("id"));
        assert_eq!(&args[..8], &strings(&["-v", "id", "-s", "166", "-p", "50", "-a", "100"])[..]);
        assert!(args[8].contains("AB satu"));

        let args = build_args(&script(), None);
        assert_eq!(args[0], "-s");
    }

    #[tokio::test]
    async fn test_missing_program_is_an_announcement_error() {
        let announcer = SpeechAnnouncer::new(SpeechConfig {
            program: "antrean-no-such-speech-engine".to_string(),
            ..SpeechConfig::default()
        });

        let result = announcer.announce(&script()).await;
        assert!(matches!(result, Err(AppError::Announcement(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_announce_is_fire_and_forget() {
        let announcer = SpeechAnnouncer::new(SpeechConfig {
            program: "true".to_string(),
            ..SpeechConfig::default()
        });

        announcer.announce(&script()).await.unwrap();
        announcer.announce(&script()).await.unwrap();
        announcer.finish().await;
        announcer.finish().await;
    }
}
