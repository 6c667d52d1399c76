//! Rendering backend that drives frames without a window.

use std::{
    collections::BTreeMap,
    io::{self, Write},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use maze_chase_rendering::{FrameControl, FrameInput, Presentation, RenderingBackend, Scene};
use maze_chase_system_scheduler::InputSender;
use tracing::{debug, info};

/// Key name in an input script that restarts the session.
const RESTART_KEY: &str = "Restart";

/// Key presses to replay, keyed by the frame they arrive on.
pub(crate) type InputScript = BTreeMap<u64, Vec<String>>;

/// Parses `frame:key` pairs separated by commas, e.g. `0:ArrowLeft,90:Space`.
pub(crate) fn parse_script(text: &str) -> Result<InputScript> {
    let mut script = InputScript::new();
    for entry in text.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some((frame, key)) = entry.split_once(':') else {
            bail!("input `{entry}` is not of the form frame:key");
        };
        let frame: u64 = frame
            .trim()
            .parse()
            .with_context(|| format!("invalid frame number in input `{entry}`"))?;
        script.entry(frame).or_default().push(key.trim().to_owned());
    }
    Ok(script)
}

/// Presents a fixed number of frames of constant length, replaying scripted
/// key presses through the input queue and printing text frames.
#[derive(Debug)]
pub(crate) struct HeadlessBackend {
    frames: u64,
    frame_duration: Duration,
    script: InputScript,
    sender: InputSender,
    print_every: Option<u64>,
}

impl HeadlessBackend {
    pub(crate) fn new(
        frames: u64,
        frame_duration: Duration,
        script: InputScript,
        sender: InputSender,
        print_every: Option<u64>,
    ) -> Self {
        Self {
            frames,
            frame_duration,
            script,
            sender,
            print_every: print_every.filter(|every| *every > 0),
        }
    }

    fn feed(&self, frame: u64) -> FrameInput {
        let mut input = FrameInput::default();
        for key in self.script.get(&frame).into_iter().flatten() {
            if key == RESTART_KEY {
                input.restart = true;
            } else {
                let _ = self.sender.send_key(key);
            }
        }
        input
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl,
    {
        let Presentation {
            window_title,
            mut scene,
            ..
        } = presentation;
        info!(title = %window_title, frames = self.frames, "headless run started");

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut presented = 0;
        for frame in 0..self.frames {
            let input = self.feed(frame);
            let control = update_scene(self.frame_duration, input, &mut scene);
            presented = frame + 1;

            if self.print_every.is_some_and(|every| frame % every == 0) {
                write!(out, "{}", scene.to_text()).context("failed to write frame")?;
            }
            if control == FrameControl::Exit {
                debug!(frame, "frame loop exited");
                break;
            }
        }

        if self.print_every.is_some() {
            write!(out, "{}", scene.to_text()).context("failed to write final frame")?;
        }
        out.flush().context("failed to flush stdout")?;
        info!(frames = presented, "headless run finished");
        Ok(())
    }
}
