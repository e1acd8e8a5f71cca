/// Evaluation report: aggregate error, per-sample values and geometry figures
use ndarray::{ArrayView2, ArrayView4, Axis};
use std::io::{BufRead, Write};

use crate::utils::format_drag;

/// Displays one geometry mask per test sample
///
/// `TerminalRenderer` draws to the terminal; a windowing or plotting
/// backend plugs in by implementing this trait and blocking in `render`
/// until its figure is closed.
pub trait GeometryRenderer {
    /// Render the geometry of test sample `index`, returning once the
    /// figure has been dismissed
    fn render(&mut self, index: usize, geometry: ArrayView2<f32>) -> crate::Result<()>;
}

/// Character ramp from empty to solid
const SHADES: &[u8] = b" .:-=+*#%@";

/// Draws masks as character art and waits for a line on `input` after each
pub struct TerminalRenderer<R, W> {
    input: R,
    output: W,
    wait: bool,
}

impl TerminalRenderer<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Render to stdout, blocking on stdin
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout(), true)
    }
}

impl<R: BufRead, W: Write> TerminalRenderer<R, W> {
    /// `wait` controls whether each figure blocks until a line is read
    pub fn new(input: R, output: W, wait: bool) -> Self {
        Self {
            input,
            output,
            wait,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> GeometryRenderer for TerminalRenderer<R, W> {
    fn render(&mut self, index: usize, geometry: ArrayView2<f32>) -> crate::Result<()> {
        writeln!(self.output, "-- geometry {} --", index)?;
        for line in shade_rows(geometry) {
            writeln!(self.output, "{}", line)?;
        }

        if self.wait {
            write!(self.output, "press Enter to continue")?;
            self.output.flush()?;
            let mut line = String::new();
            self.input.read_line(&mut line)?;
        }

        Ok(())
    }
}

/// Min-max normalize a mask onto the character ramp, one string per row
///
/// A constant mask renders with the lightest shade.
pub fn shade_rows(geometry: ArrayView2<f32>) -> Vec<String> {
    let (min, max) = geometry
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    let top = (SHADES.len() - 1) as f32;

    geometry
        .outer_iter()
        .map(|row| {
            row.iter()
                .map(|&v| {
                    let level = if range > 0.0 && v.is_finite() {
                        (((v - min) / range) * top).round() as usize
                    } else {
                        0
                    };
                    SHADES[level.min(SHADES.len() - 1)] as char
                })
                .collect()
        })
        .collect()
}

/// Writes the evaluation report
pub struct Reporter<'a, W: Write> {
    out: &'a mut W,
    renderer: &'a mut dyn GeometryRenderer,
}

impl<'a, W: Write> Reporter<'a, W> {
    pub fn new(out: &'a mut W, renderer: &'a mut dyn GeometryRenderer) -> Self {
        Self { out, renderer }
    }

    pub fn aggregate(&mut self, mse: f32) -> crate::Result<()> {
        writeln!(self.out, "Average Mean Squared Error: {}", mse)?;
        Ok(())
    }

    /// True/predicted lines and one rendered figure per sample, in order
    ///
    /// `geometries` is [n, h, w, c]; channel 0 is rendered. `targets` and
    /// `predictions` hold one row per sample.
    pub fn samples(
        &mut self,
        geometries: ArrayView4<f32>,
        targets: &[Vec<f32>],
        predictions: &[Vec<f32>],
    ) -> crate::Result<()> {
        let count = geometries.len_of(Axis(0));
        if targets.len() != count || predictions.len() != count {
            return Err(crate::DragError::Data(format!(
                "Report size mismatch: {} geometries, {} targets, {} predictions",
                count,
                targets.len(),
                predictions.len()
            )));
        }

        for (i, geometry) in geometries.outer_iter().enumerate() {
            writeln!(self.out, "geometry in plot")?;
            writeln!(self.out, "true drag is     : {}", format_drag(&targets[i]))?;
            writeln!(self.out, "predicted drag is: {}", format_drag(&predictions[i]))?;
            self.out.flush()?;

            self.renderer.render(i, geometry.index_axis(Axis(2), 0))?;
        }

        Ok(())
    }
}
