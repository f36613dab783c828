use plotters::prelude::*;

use crate::domain::session::ChartBar;

const CHART_SIZE: (u32, u32) = (800, 600);

/// Type-count bar chart as an SVG document.
pub fn render_chart_svg(bars: &[ChartBar]) -> Result<String, String> {
    if bars.is_empty() {
        return Err("Nothing to chart yet, upload a file first".to_string());
    }

    let max = bars.iter().map(|bar| bar.value).max().unwrap_or(0);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Equipment Type Distribution", ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((0..bars.len() as i32).into_segmented(), 0u64..max + 1)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Type")
            .y_desc("Count")
            .x_label_formatter(&|value| match value {
                SegmentValue::CenterOf(idx) => bars
                    .get(*idx as usize)
                    .map(|bar| bar.label.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(bars.iter().enumerate().map(|(idx, bar)| {
                let idx = idx as i32;
                let mut rect = Rectangle::new(
                    [
                        (SegmentValue::Exact(idx), 0),
                        (SegmentValue::Exact(idx + 1), bar.value),
                    ],
                    BLUE.filled(),
                );
                rect.set_margin(0, 0, 10, 10);
                rect
            }))
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }
    Ok(svg)
}
