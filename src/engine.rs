// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render orchestrator: validate, partition, fan out one scoped
//! thread per band, and wait for the aggregator to hand back the
//! finished grid.  The wait is the only synchronization point; callers
//! see one blocking call and never a partial image.

use crossbeam::channel;
use log::debug;

use crate::aggregate::Aggregator;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::grid::PixelGrid;
use crate::partition::{partition, Band};
use crate::worker::{self, RowBand};

/// A validated render request.
#[derive(Copy, Clone, Debug)]
pub struct RenderEngine {
    config: RenderConfig,
}

impl RenderEngine {
    /// Validates `config` once, so that later renders cannot fail on it.
    pub fn new(config: RenderConfig) -> Result<RenderEngine, RenderError> {
        config.validate()?;
        Ok(RenderEngine { config })
    }

    /// The request this engine renders.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders the whole image.
    pub fn render(&self) -> Result<PixelGrid, RenderError> {
        render(&self.config)
    }

    /// Renders the top half and reflects it.
    pub fn render_mirrored(&self) -> Result<PixelGrid, RenderError> {
        render_mirrored(&self.config)
    }
}

/// Renders every pixel of `config`.  The result is identical whatever
/// the worker count.
pub fn render(config: &RenderConfig) -> Result<PixelGrid, RenderError> {
    config.validate()?;
    render_rows(config, config.height)
}

/// Renders rows `[0, ceil(height / 2))` and fills row `height - 1 - r`
/// with a copy of row `r`.  Only meaningful when the plane is centered
/// on the real axis, where the set is its own reflection; any other
/// plane is rejected.
pub fn render_mirrored(config: &RenderConfig) -> Result<PixelGrid, RenderError> {
    config.validate()?;
    if !config.plane.is_symmetric() {
        return Err(RenderError::AsymmetricPlane(
            config.plane.0.im,
            config.plane.1.im,
        ));
    }
    let computed = (config.height + 1) / 2;
    let half = render_rows(config, computed)?;

    let mut pixels = Vec::with_capacity(config.pixel_count());
    for row in 0..config.height {
        let source = if row < computed {
            row
        } else {
            config.height - 1 - row
        };
        pixels.extend_from_slice(half.row(source));
    }
    Ok(PixelGrid::from_raw(config.width, config.height, pixels))
}

// Computes the first `rows` rows of the image described by `config`.
fn render_rows(config: &RenderConfig, rows: u32) -> Result<PixelGrid, RenderError> {
    let bands = partition(rows, config.workers);
    debug!(
        "rendering {} of {} rows at {}x{}, {} iterations, across {} bands",
        rows,
        config.height,
        config.width,
        config.height,
        config.max_iterations,
        bands.len()
    );
    fan_out(config.width, rows, bands, |band| worker::run(band, config))
}

// Runs `job` on every band in its own scoped thread and assembles the
// results into a `width` x `rows` grid.
fn fan_out<F>(width: u32, rows: u32, bands: Vec<Band>, job: F) -> Result<PixelGrid, RenderError>
where
    F: Fn(Band) -> RowBand + Sync,
{
    let band_count = bands.len();
    let aggregator = Aggregator::new(width, rows);
    let (sender, receiver) = channel::unbounded();
    let job = &job;
    crossbeam::scope(|spawner| {
        for band in bands {
            let sender = sender.clone();
            spawner.spawn(move |_| {
                // The receiver lives until the scope closes, so the send
                // cannot fail.
                let _ = sender.send(job(band));
            });
        }
        // Only the workers may hold senders, or a dead worker would
        // leave the aggregator waiting forever.
        drop(sender);
        aggregator.collect(&receiver, band_count)
    })
    .map_err(|_| RenderError::WorkerPanicked)?
}
