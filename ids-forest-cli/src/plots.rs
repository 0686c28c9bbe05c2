//! Evaluation charts rendered to PNG files
//!
//! Image sizes follow the figure size in inches at 300 DPI. Text is rendered with the bundled
//! DejaVu Sans font, so no system fonts are needed.
use std::error::Error;
use std::path::Path;
use std::sync::OnceLock;

use ids_forest::metrics::{ConfusionMatrix, ReceiverOperatingCharacteristic};
use ids_forest::validation::LearningCurve;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub type PlotResult = Result<(), Box<dyn Error + Send + Sync>>;

pub const CONFUSION_MATRIX: &str = "confusion_matrix.png";
pub const ROC_CURVE: &str = "roc_curve.png";
pub const FEATURE_IMPORTANCE: &str = "feature_importance.png";
pub const CLASS_DISTRIBUTION: &str = "class_distribution.png";
pub const LEARNING_CURVE: &str = "learning_curve.png";

const DPI: f64 = 300.0;
const FONT: &str = "sans-serif";
const GREY: RGBColor = RGBColor(128, 128, 128);
const ORANGE: RGBColor = RGBColor(255, 127, 14);

static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

/// Register the bundled font under the family every chart draws with
fn register_font() -> PlotResult {
    let registered = *FONT_REGISTERED.get_or_init(|| {
        plotters::style::register_font(FONT, FontStyle::Normal, FONT_DATA).is_ok()
    });
    if registered {
        Ok(())
    } else {
        Err("bundled chart font cannot be loaded".into())
    }
}

/// Pixel size of a figure given in inches
fn pixels(width: f64, height: f64) -> (u32, u32) {
    ((width * DPI) as u32, (height * DPI) as u32)
}

/// Sequential white to dark blue colour map, `t` in `[0, 1]`
fn blues(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * t).round() as u8;

    RGBColor(lerp(247, 8), lerp(251, 48), lerp(255, 107))
}

/// Annotated heatmap of the confusion matrix, actual classes as rows from top to bottom
pub fn confusion_matrix(
    path: &Path,
    cm: &ConfusionMatrix<usize>,
    names: &[String],
) -> PlotResult {
    let matrix = cm.matrix();
    let k = matrix.nrows() as i32;
    if k == 0 {
        return Ok(());
    }

    register_font()?;
    let root = BitMapBackend::new(path, pixels(6.0, 5.0)).into_drawing_area();
    root.fill(&WHITE)?;

    let name_of = |idx: i32| {
        usize::try_from(idx)
            .ok()
            .and_then(|idx| names.get(idx))
            .cloned()
            .unwrap_or_default()
    };
    let column_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(col) => name_of(*col),
        _ => String::new(),
    };
    let row_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(y) => name_of(k - 1 - *y),
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(&root)
        .caption("Confusion matrix", (FONT, 60))
        .margin(40)
        .x_label_area_size(120)
        .y_label_area_size(220)
        .build_cartesian_2d((0..k - 1).into_segmented(), (0..k - 1).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(k as usize + 1)
        .y_labels(k as usize + 1)
        .x_label_formatter(&column_label)
        .y_label_formatter(&row_label)
        .x_desc("Predicted")
        .y_desc("Actual")
        .label_style((FONT, 36))
        .axis_desc_style((FONT, 44))
        .draw()?;

    let peak = matrix.iter().copied().max().unwrap_or(0).max(1) as f64;
    let cells = matrix
        .indexed_iter()
        .map(|((row, col), count)| (k - 1 - row as i32, col as i32, *count))
        .collect::<Vec<_>>();

    chart.draw_series(cells.iter().map(|(y, x, count)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(*x), SegmentValue::Exact(*y)),
                (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
            ],
            blues(*count as f64 / peak).filled(),
        )
    }))?;

    chart.draw_series(cells.iter().map(|(y, x, count)| {
        let colour = if *count as f64 / peak > 0.5 { WHITE } else { BLACK };
        Text::new(
            count.to_string(),
            (SegmentValue::CenterOf(*x), SegmentValue::CenterOf(*y)),
            (FONT, 56)
                .into_font()
                .color(&colour)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// ROC curve with the area under it in the legend and the chance diagonal
pub fn roc_curve(path: &Path, roc: &ReceiverOperatingCharacteristic<f64>) -> PlotResult {
    register_font()?;
    let root = BitMapBackend::new(path, pixels(8.0, 6.0)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("ROC curve", (FONT, 60))
        .margin(40)
        .x_label_area_size(120)
        .y_label_area_size(140)
        .build_cartesian_2d(0f64..1f64, 0f64..1.05f64)?;

    chart
        .configure_mesh()
        .x_desc("False positive rate")
        .y_desc("True positive rate")
        .label_style((FONT, 36))
        .axis_desc_style((FONT, 44))
        .draw()?;

    chart
        .draw_series(LineSeries::new(roc.get_curve(), BLUE.stroke_width(6)))?
        .label(format!("ROC curve (AUC = {:.4})", roc.area_under_curve()))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 60, y)], BLUE.stroke_width(6)));

    chart
        .draw_series(LineSeries::new(
            vec![(0.0, 0.0), (1.0, 1.0)],
            GREY.stroke_width(3),
        ))?
        .label("Random guess")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 60, y)], GREY.stroke_width(3)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .label_font((FONT, 36))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Horizontal bars of the feature importances, most important feature on top
pub fn feature_importance(path: &Path, names: &[String], importances: &[f64]) -> PlotResult {
    let mut ranked = names
        .iter()
        .map(String::as_str)
        .zip(importances.iter().copied())
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let n = ranked.len() as i32;
    if n == 0 {
        return Ok(());
    }
    let top = ranked[0].1.max(f64::EPSILON) * 1.1;

    register_font()?;
    let root = BitMapBackend::new(path, pixels(10.0, 6.0)).into_drawing_area();
    root.fill(&WHITE)?;

    let feature_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(y) => usize::try_from(n - 1 - *y)
            .ok()
            .and_then(|rank| ranked.get(rank))
            .map(|(name, _)| name.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(&root)
        .caption("Feature importance", (FONT, 60))
        .margin(40)
        .x_label_area_size(120)
        .y_label_area_size(400)
        .build_cartesian_2d(0f64..top, (0..n - 1).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n as usize + 1)
        .y_label_formatter(&feature_label)
        .x_desc("Importance")
        .label_style((FONT, 32))
        .axis_desc_style((FONT, 44))
        .draw()?;

    chart.draw_series(
        Histogram::horizontal(&chart)
            .style(BLUE.mix(0.8).filled())
            .margin(10)
            .data(
                ranked
                    .iter()
                    .enumerate()
                    .map(|(rank, (_, importance))| (n - 1 - rank as i32, *importance)),
            ),
    )?;

    root.present()?;
    Ok(())
}

/// Bar chart of the number of samples per class
pub fn class_distribution(path: &Path, names: &[String], counts: &[usize]) -> PlotResult {
    let k = counts.len() as i32;
    if k == 0 {
        return Ok(());
    }
    let top = counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.1;

    register_font()?;
    let root = BitMapBackend::new(path, pixels(6.0, 4.0)).into_drawing_area();
    root.fill(&WHITE)?;

    let class_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(x) => usize::try_from(*x)
            .ok()
            .and_then(|idx| names.get(idx))
            .cloned()
            .unwrap_or_default(),
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(&root)
        .caption("Class distribution", (FONT, 60))
        .margin(40)
        .x_label_area_size(120)
        .y_label_area_size(180)
        .build_cartesian_2d((0..k - 1).into_segmented(), 0f64..top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(k as usize + 1)
        .x_label_formatter(&class_label)
        .y_label_formatter(&|v| format!("{:.0}", v))
        .x_desc("Class")
        .y_desc("Samples")
        .label_style((FONT, 36))
        .axis_desc_style((FONT, 44))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.filled())
            .margin(40)
            .data(counts.iter().enumerate().map(|(idx, c)| (idx as i32, *c as f64))),
    )?;

    root.present()?;
    Ok(())
}

/// Mean training and test scores over the training set sizes
pub fn learning_curve(path: &Path, curve: &LearningCurve) -> PlotResult {
    let sizes = curve
        .train_sizes
        .iter()
        .map(|size| *size as f64)
        .collect::<Vec<_>>();
    let right = sizes.iter().copied().fold(1.0, f64::max) * 1.05;

    register_font()?;
    let root = BitMapBackend::new(path, pixels(8.0, 6.0)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Learning curve", (FONT, 60))
        .margin(40)
        .x_label_area_size(120)
        .y_label_area_size(140)
        .build_cartesian_2d(0f64..right, 0f64..1.05f64)?;

    chart
        .configure_mesh()
        .x_desc("Training samples")
        .y_desc("F1-score")
        .label_style((FONT, 36))
        .axis_desc_style((FONT, 44))
        .draw()?;

    for (label, scores, colour) in [
        ("Training score", curve.train_mean(), BLUE),
        ("Test score", curve.test_mean(), ORANGE),
    ] {
        let points = sizes
            .iter()
            .copied()
            .zip(scores.iter().copied())
            .collect::<Vec<_>>();

        chart
            .draw_series(LineSeries::new(points.clone(), colour.stroke_width(5)))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 60, y)], colour.stroke_width(5))
            });
        chart.draw_series(
            points
                .into_iter()
                .map(|point| Circle::new(point, 10, colour.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .label_font((FONT, 36))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ids_forest::metrics::{BinaryClassification, ToConfusionMatrix};
    use ndarray::{array, Array2};

    #[test]
    fn figure_sizes_at_300_dpi() {
        assert_eq!(pixels(6.0, 5.0), (1800, 1500));
        assert_eq!(pixels(8.0, 6.0), (2400, 1800));
        assert_eq!(pixels(10.0, 6.0), (3000, 1800));
        assert_eq!(pixels(6.0, 4.0), (1800, 1200));
    }

    #[test]
    fn colour_map_ends() {
        assert_eq!(blues(0.0), RGBColor(247, 251, 255));
        assert_eq!(blues(1.0), RGBColor(8, 48, 107));
        assert_eq!(blues(2.0), blues(1.0));
    }

    #[test]
    fn class_names_are_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        let third = dir.path().join("third.png");

        let names = vec!["benign".to_string(), "malicious".to_string()];
        class_distribution(&first, &names, &[70, 30]).unwrap();
        class_distribution(&second, &names, &[70, 30]).unwrap();
        class_distribution(
            &third,
            &["normal".to_string(), "attack".to_string()],
            &[70, 30],
        )
        .unwrap();

        let read = |path: &Path| std::fs::read(path).unwrap();
        assert_eq!(read(&first), read(&second));
        assert_ne!(read(&first), read(&third));
    }

    #[test]
    fn charts_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let names = vec!["benign".to_string(), "malicious".to_string()];

        let cm = array![0usize, 1, 1, 0]
            .confusion_matrix(&array![0usize, 1, 0, 0])
            .unwrap();
        confusion_matrix(&dir.path().join(CONFUSION_MATRIX), &cm, &names).unwrap();

        let roc = array![0.1, 0.8, 0.6, 0.3].roc(&[false, true, false, true]).unwrap();
        roc_curve(&dir.path().join(ROC_CURVE), &roc).unwrap();

        feature_importance(
            &dir.path().join(FEATURE_IMPORTANCE),
            &["rate".to_string(), "duration".to_string()],
            &[0.3, 0.7],
        )
        .unwrap();
        class_distribution(&dir.path().join(CLASS_DISTRIBUTION), &names, &[70, 30]).unwrap();

        let curve = LearningCurve {
            train_sizes: vec![10, 20],
            train_scores: Array2::from_elem((2, 3), 1.0),
            test_scores: array![[0.5, 0.6, 0.7], [0.8, 0.8, 0.9]],
        };
        learning_curve(&dir.path().join(LEARNING_CURVE), &curve).unwrap();

        for file in [
            CONFUSION_MATRIX,
            ROC_CURVE,
            FEATURE_IMPORTANCE,
            CLASS_DISTRIBUTION,
            LEARNING_CURVE,
        ] {
            assert!(dir.path().join(file).is_file(), "{} missing", file);
        }
    }
}
