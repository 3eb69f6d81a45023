use std::{fs, path::Path};

use anyhow::{Context, bail};
use blockfall_engine::{Button, InputEvent};

/// Input script for headless runs.
///
/// One line per frame. A line holds whitespace-separated tokens, `+name` for a
/// press and `-name` for a release, where `name` is a button name such as
/// `left` or `hard-drop`. An empty line is a frame without input; text after
/// `#` is ignored.
#[derive(Debug, Default)]
pub(crate) struct Script {
    frames: Vec<Vec<InputEvent>>,
}

impl Script {
    pub(crate) fn read<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to open input script: {}", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("Failed to parse input script: {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> anyhow::Result<Self> {
        let frames = text
            .lines()
            .enumerate()
            .map(|(index, line)| parse_line(line).with_context(|| format!("line {}", index + 1)))
            .collect::<anyhow::Result<_>>()?;
        Ok(Self { frames })
    }

    pub(crate) fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Input of the given frame; frames past the end have none.
    pub(crate) fn frame(&self, index: usize) -> &[InputEvent] {
        self.frames.get(index).map_or(&[], Vec::as_slice)
    }
}

fn parse_line(line: &str) -> anyhow::Result<Vec<InputEvent>> {
    let code = line.split_once('#').map_or(line, |(code, _comment)| code);
    code.split_whitespace().map(parse_token).collect()
}

fn parse_token(token: &str) -> anyhow::Result<InputEvent> {
    let (pressed, name) = if let Some(name) = token.strip_prefix('+') {
        (true, name)
    } else if let Some(name) = token.strip_prefix('-') {
        (false, name)
    } else {
        bail!("expected `+` or `-` before button name, got {token:?}");
    };
    let button: Button = name.parse()?;
    Ok(InputEvent { button, pressed })
}
