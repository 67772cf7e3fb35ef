use chrono::{Datelike, NaiveDate};
use egui::Color32;
use egui_plot::{Line, MarkerShape, PlotPoints, PlotUi, Points, Polygon};

use crate::bmi::{BmiCategory, BmiProfile};
use crate::error::{Result, TrackerError};
use crate::store::WeightRecord;
use crate::table::sorted_by_date;

/// Colour of the weight line and the latest-point marker.
pub const LINE_RGB: (u8, u8, u8) = (0xCE, 0x1D, 0x6A);

pub const CHART_TITLE: &str = "Weight over time";

fn line_color() -> Color32 {
    let (r, g, b) = LINE_RGB;
    Color32::from_rgb(r, g, b)
}

/// Map a date to the x coordinate used by all charts.
pub fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Inverse of [`date_to_x`], used for axis labels and tooltips.
pub fn x_to_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("{:.0}", x))
}

/// A shaded horizontal region for one BMI category.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub category: BmiCategory,
    pub lower: f64,
    pub upper: f64,
}

/// Everything needed to draw the weight chart, independent of the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightChart {
    /// `[x, weight]` in ascending date order.
    pub points: Vec<[f64; 2]>,
    pub label: String,
    /// The most recent measurement.
    pub latest: [f64; 2],
    /// Horizontal extent of the bands.
    pub x_span: (f64, f64),
    /// Empty when no BMI profile was supplied.
    pub bands: Vec<Band>,
}

/// Build the weight-over-time chart, with BMI bands when `bmi` is given.
pub fn render_time_series(
    records: &[WeightRecord],
    bmi: Option<&BmiProfile>,
) -> Result<WeightChart> {
    let sorted = sorted_by_date(records);
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Err(TrackerError::EmptyInput);
    };
    let points: Vec<[f64; 2]> = sorted
        .iter()
        .map(|r| [date_to_x(r.date), r.weight])
        .collect();
    let latest = [date_to_x(last.date), last.weight];

    let mut x_span = (date_to_x(first.date), date_to_x(last.date));
    if x_span.0 == x_span.1 {
        x_span = (x_span.0 - 0.5, x_span.1 + 0.5);
    }

    let (label, bands) = match bmi {
        Some(profile) => {
            let bounds = profile.boundaries();
            let bands = BmiCategory::ALL
                .iter()
                .map(|&category| {
                    let (lower, upper) = bounds.band(category);
                    Band {
                        category,
                        lower,
                        upper,
                    }
                })
                .collect();
            (profile.series_label(), bands)
        }
        None => ("Weight".to_string(), Vec::new()),
    };

    Ok(WeightChart {
        points,
        label,
        latest,
        x_span,
        bands,
    })
}

impl WeightChart {
    pub fn line(&self) -> Line {
        Line::new(PlotPoints::from(self.points.clone()))
            .name(&self.label)
            .color(line_color())
            .width(3.0)
    }

    pub fn latest_marker(&self) -> Points {
        Points::new(vec![self.latest])
            .shape(MarkerShape::Circle)
            .radius(6.0)
            .filled(true)
            .color(line_color())
    }

    pub fn band_polygons(&self) -> Vec<Polygon> {
        let (x0, x1) = self.x_span;
        self.bands
            .iter()
            .map(|b| {
                let corners = vec![[x0, b.lower], [x1, b.lower], [x1, b.upper], [x0, b.upper]];
                Polygon::new(PlotPoints::from(corners))
                    .fill_color(b.category.fill())
                    .stroke(egui::Stroke::NONE)
                    .name(b.category.label())
            })
            .collect()
    }

    /// Draw bands first so the line stays on top.
    pub fn show(&self, plot_ui: &mut PlotUi) {
        for polygon in self.band_polygons() {
            plot_ui.polygon(polygon);
        }
        plot_ui.line(self.line());
        plot_ui.points(self.latest_marker());
    }

    /// Weight range shown on the y axis: the full band stack when bands are
    /// present, otherwise the data with a small margin. The range always
    /// covers every measurement.
    pub fn y_range(&self) -> (f64, f64) {
        let (min, max) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p[1]), hi.max(p[1]))
            });
        let margin = ((max - min) * 0.1).max(1.0);
        match self.bands.last() {
            Some(top) => (0.0, top.upper.max(max + margin)),
            None => ((min - margin).max(0.0), max + margin),
        }
    }
}

/// Return the data point closest to the pointer in x.
pub fn nearest_point(pointer: egui_plot::PlotPoint, points: &[[f64; 2]]) -> Option<[f64; 2]> {
    points.iter().copied().min_by(|a, b| {
        let da = (a[0] - pointer.x).abs();
        let db = (b[0] - pointer.x).abs();
        da.total_cmp(&db)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmi::compute_bmi;
    use egui_plot::{PlotGeometry, PlotItem};

    fn rec(date: &str, weight: f64) -> WeightRecord {
        WeightRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            weight,
        }
    }

    fn x(date: &str) -> f64 {
        date_to_x(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap())
    }

    fn sample_records() -> Vec<WeightRecord> {
        vec![
            rec("2023-01-05", 78.5),
            rec("2023-01-01", 79.0),
            rec("2023-01-09", 77.8),
        ]
    }

    fn line_points(line: Line) -> Vec<[f64; 2]> {
        if let PlotGeometry::Points(points) = line.geometry() {
            points.iter().map(|p| [p.x, p.y]).collect()
        } else {
            panic!("expected points")
        }
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            render_time_series(&[], None),
            Err(TrackerError::EmptyInput)
        ));
    }

    #[test]
    fn points_are_sorted_by_date() {
        let chart = render_time_series(&sample_records(), None).unwrap();
        let expected = vec![
            [x("2023-01-01"), 79.0],
            [x("2023-01-05"), 78.5],
            [x("2023-01-09"), 77.8],
        ];
        assert_eq!(chart.points, expected);
        assert_eq!(line_points(chart.line()), expected);
        assert_eq!(chart.latest, [x("2023-01-09"), 77.8]);
    }

    #[test]
    fn plain_chart_has_no_bands() {
        let chart = render_time_series(&sample_records(), None).unwrap();
        assert_eq!(chart.label, "Weight");
        assert!(chart.bands.is_empty());
        assert!(chart.band_polygons().is_empty());
        let (lo, hi) = chart.y_range();
        assert!(lo < 77.8 && hi > 79.0);
    }

    #[test]
    fn bmi_profile_adds_four_stacked_bands() {
        let profile = compute_bmi("70", "175").unwrap();
        let chart = render_time_series(&sample_records(), Some(&profile)).unwrap();
        assert_eq!(chart.label, "Weight (BMI: 22.86)");
        assert_eq!(chart.x_span, (x("2023-01-01"), x("2023-01-09")));

        let cats: Vec<BmiCategory> = chart.bands.iter().map(|b| b.category).collect();
        assert_eq!(cats, BmiCategory::ALL.to_vec());
        assert_eq!(chart.bands[0].lower, 0.0);
        for w in chart.bands.windows(2) {
            assert_eq!(w[0].upper, w[1].lower);
        }
        assert_eq!(chart.bands[3].upper, 300.0);
        assert!((chart.bands[1].upper - 76.256_25).abs() < 1e-6);
        assert_eq!(chart.band_polygons().len(), 4);
        assert_eq!(chart.y_range(), (0.0, 300.0));
    }

    #[test]
    fn banded_range_grows_past_the_ceiling() {
        let profile = compute_bmi("320", "180").unwrap();
        let records = vec![rec("2023-01-01", 310.0), rec("2023-01-08", 320.0)];
        let chart = render_time_series(&records, Some(&profile)).unwrap();
        let (lo, hi) = chart.y_range();
        assert_eq!(lo, 0.0);
        assert!(hi > 320.0);
        assert_eq!(chart.bands[3].upper, 300.0);
    }

    #[test]
    fn single_record_gets_a_visible_span() {
        let chart = render_time_series(&[rec("2023-01-01", 80.0)], None).unwrap();
        let x0 = x("2023-01-01");
        assert_eq!(chart.x_span, (x0 - 0.5, x0 + 0.5));
        assert_eq!(chart.latest, [x0, 80.0]);
    }

    #[test]
    fn x_labels_are_iso_dates() {
        assert_eq!(x_to_label(x("2023-01-05")), "2023-01-05");
    }

    #[test]
    fn nearest_point_picks_closest_x() {
        let pts = vec![[0.0, 1.0], [10.0, 2.0], [20.0, 3.0]];
        let p = nearest_point(egui_plot::PlotPoint::new(12.0, 0.0), &pts);
        assert_eq!(p, Some([10.0, 2.0]));
        assert_eq!(nearest_point(egui_plot::PlotPoint::new(0.0, 0.0), &[]), None);
    }
}
