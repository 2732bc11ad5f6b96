//! Desktop stand-ins for the browser pieces the engine talks to.

use std::{
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use codefreq_core::{
    parse_feed, AssetStore, CodeFreqError, Content, FrameSource, Layer, LoadRequest, LoadTicket,
    Loader, Renderer, Result, Visual, World,
};

/// Reads the feed file on a worker thread.
#[derive(Debug)]
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Loader for FileLoader {
    fn begin(&mut self, request: LoadRequest) -> LoadTicket {
        let (ticket, completer) = LoadTicket::pending();
        let path = self.path.clone();
        thread::spawn(move || completer.complete(load_content(&path, &request)));
        ticket
    }
}

fn load_content(path: &Path, request: &LoadRequest) -> Result<Content> {
    let json = std::fs::read_to_string(path)
        .map_err(|err| CodeFreqError::load(format!("{}: {err}", path.display())))?;
    let feed = parse_feed(&json)?;
    let assets = AssetStore::builtin();
    assets
        .ensure(&request.textures)
        .map_err(|err| CodeFreqError::load(err.to_string()))?;
    tracing::debug!(path = %path.display(), periods = feed.len(), "feed read");
    Ok(Content { feed, assets })
}

/// Wall-clock paced frames at a fixed rate.
#[derive(Debug)]
pub struct PacedFrames {
    started: Instant,
    interval: Duration,
    next_deadline: Duration,
    remaining: Option<u64>,
}

impl PacedFrames {
    pub fn new(fps: f64, limit: Option<u64>) -> Self {
        Self {
            started: Instant::now(),
            interval: Duration::from_secs_f64(1.0 / fps.max(1.0)),
            next_deadline: Duration::ZERO,
            remaining: limit,
        }
    }
}

impl FrameSource for PacedFrames {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(remaining) = &mut self.remaining {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        let elapsed = self.started.elapsed();
        if elapsed < self.next_deadline {
            thread::sleep(self.next_deadline - elapsed);
        }
        self.next_deadline += self.interval;
        Some(self.started.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Logs a summary of the scene every `every` frames instead of drawing it.
#[derive(Debug)]
pub struct ConsoleRenderer {
    every: u64,
    frames: u64,
}

impl ConsoleRenderer {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            frames: 0,
        }
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&mut self, world: &World) -> Result<()> {
        self.frames += 1;
        if self.frames % self.every != 0 {
            return Ok(());
        }
        let labels: Vec<&str> = world
            .draw_list()
            .filter(|(layer, _)| *layer == Layer::Planet)
            .filter_map(|(_, entity)| match &entity.sprite.visual {
                Visual::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        tracing::info!(
            frame = self.frames,
            entities = world.len(),
            plus = world.count_in(Layer::Plus),
            minus = world.count_in(Layer::Minus),
            trails = world.count_in(Layer::PlusTrails) + world.count_in(Layer::MinusTrails),
            labels = ?labels,
            "frame"
        );
        Ok(())
    }
}
