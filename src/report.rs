use plotters::prelude::*;
use std::path::Path;

use crate::plotting::{CHART_TITLE, LINE_RGB, WeightChart, x_to_label};

const FIGURE_BG: RGBColor = RGBColor(0xC2, 0x93, 0x80);
const AXES_BG: RGBColor = RGBColor(0x6C, 0x7C, 0x96);

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

/// Save `chart` as a PNG image of the given size.
pub fn save_chart_png(
    chart: &WeightChart,
    path: &Path,
    size: (u32, u32),
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&FIGURE_BG)?;

    let (x0, x1) = chart.x_span;
    let (y0, y1) = chart.y_range();
    let mut ctx = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    ctx.plotting_area().fill(&AXES_BG)?;
    ctx.configure_mesh()
        .x_desc("Date")
        .y_desc("Weight")
        .x_labels(6)
        .x_label_formatter(&|x| x_to_label(*x))
        .disable_mesh()
        .draw()?;

    for band in &chart.bands {
        let color = rgb(band.category.rgb());
        ctx.draw_series(std::iter::once(Rectangle::new(
            [(x0, band.lower), (x1, band.upper)],
            color.mix(0.4).filled(),
        )))?
        .label(band.category.label())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.mix(0.4).filled()));
    }

    let line = rgb(LINE_RGB);
    ctx.draw_series(LineSeries::new(
        chart.points.iter().map(|p| (p[0], p[1])),
        line.stroke_width(3),
    ))?
    .label(chart.label.as_str())
    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], line.stroke_width(3)));

    ctx.draw_series(std::iter::once(Circle::new(
        (chart.latest[0], chart.latest[1]),
        6,
        line.filled(),
    )))?;

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    log::info!("Saved weight chart to {}", path.display());
    Ok(())
}
