/// Best-effort sound output.
///
/// With the `audio` feature the clips play through rodio; without it (or
/// when no output device opens) every call is a silent no-op.  Playback
/// failures are logged and otherwise ignored.
use tracing::trace;
#[cfg(feature = "audio")]
use tracing::warn;

use crate::assets::SoundClip;
use crate::entities::GameEvent;

#[cfg(feature = "audio")]
mod backend {
    use std::io::Cursor;

    use anyhow::{Context, Result};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    pub struct Output {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        music: Option<Sink>,
    }

    impl Output {
        pub fn open() -> Result<Self> {
            let (stream, handle) =
                OutputStream::try_default().context("no audio output device")?;
            Ok(Output { _stream: stream, handle, music: None })
        }

        pub fn play_once(&self, bytes: &[u8]) -> Result<()> {
            let sink = Sink::try_new(&self.handle).context("failed to open sink")?;
            let source = Decoder::new(Cursor::new(bytes.to_vec())).context("undecodable clip")?;
            sink.append(source);
            sink.detach();
            Ok(())
        }

        pub fn loop_music(&mut self, bytes: &[u8]) -> Result<()> {
            let sink = Sink::try_new(&self.handle).context("failed to open sink")?;
            let source = Decoder::new(Cursor::new(bytes.to_vec())).context("undecodable music")?;
            sink.append(source.repeat_infinite());
            self.music = Some(sink);
            Ok(())
        }
    }
}

pub struct Audio {
    #[cfg(feature = "audio")]
    output: Option<backend::Output>,
    hit: Option<SoundClip>,
}

impl Audio {
    /// Open the default output device (when built with `audio`).
    pub fn new(hit: Option<SoundClip>) -> Self {
        #[cfg(feature = "audio")]
        let output = match backend::Output::open() {
            Ok(output) => Some(output),
            Err(err) => {
                warn!(error = %err, "audio disabled");
                None
            }
        };
        Audio {
            #[cfg(feature = "audio")]
            output,
            hit,
        }
    }

    /// An audio front-end that never makes a sound.
    pub fn silent() -> Self {
        Audio {
            #[cfg(feature = "audio")]
            output: None,
            hit: None,
        }
    }

    fn clip_for(&self, event: GameEvent) -> Option<&SoundClip> {
        match event {
            GameEvent::InvaderDestroyed | GameEvent::BarrierHit | GameEvent::PlayerHit => {
                self.hit.as_ref()
            }
        }
    }

    pub fn on_event(&self, event: GameEvent) {
        let Some(clip) = self.clip_for(event) else {
            return;
        };
        trace!(?event, bytes = clip.bytes().len(), "sound effect");
        #[cfg(feature = "audio")]
        if let Some(output) = &self.output {
            if let Err(err) = output.play_once(clip.bytes()) {
                warn!(error = %err, "sound effect failed");
            }
        }
    }

    /// Start looping the background track; silently does nothing on failure.
    pub fn start_music(&mut self, clip: Option<&SoundClip>) {
        let Some(clip) = clip else {
            return;
        };
        trace!(bytes = clip.bytes().len(), "background music");
        #[cfg(feature = "audio")]
        if let Some(output) = &mut self.output {
            if let Err(err) = output.loop_music(clip.bytes()) {
                warn!(error = %err, "background music failed");
            }
        }
    }
}
