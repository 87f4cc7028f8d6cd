//! Loss curve rendering.

use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::path::Path;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

/// Render the per-epoch training loss as an SVG line chart.
///
/// x is the epoch index, y the total loss.
pub fn plot_loss_curve<P: AsRef<Path>>(losses: &[f64], path: P) -> Result<()> {
    let path = path.as_ref();
    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("SVG render error: {}", e))?;

    let (y_min, y_max) = value_range(losses);
    let x_max = losses.len().max(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption("Training Loss Over Epochs", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)
        .map_err(|e| anyhow!("Chart build error: {}", e))?;

    chart.configure_mesh()
        .x_desc("Epoch")
        .y_desc("Loss")
        .draw()
        .map_err(|e| anyhow!("Grid draw error: {}", e))?;

    chart.draw_series(LineSeries::new(
        losses.iter().enumerate().map(|(epoch, &loss)| (epoch as f64, loss)),
        &BLUE,
    ))
    .map_err(|e| anyhow!("Line series error: {}", e))?
    .label("Training Loss")
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| anyhow!("Legend draw error: {}", e))?;

    root.present()
        .map_err(|e| anyhow!("Present error: {}", e))?;

    Ok(())
}

/// Finite y-range with a little headroom; flat or empty series get a unit band.
fn value_range(values: &[f64]) -> (f64, f64) {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_value_range() {
        assert_eq!(value_range(&[]), (0.0, 1.0));
        assert_eq!(value_range(&[2.0, 2.0]), (1.5, 2.5));

        let (lo, hi) = value_range(&[1.0, f64::NAN, 3.0]);
        assert!(lo < 1.0 && hi > 3.0);
    }

    #[test]
    fn test_plot_loss_curve() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("loss_plot.svg");
        let losses: Vec<f64> = (0..50).map(|i| 10.0 / (i as f64 + 1.0)).collect();

        plot_loss_curve(&losses, &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Training Loss"));
    }
}
