use std::path::Path;

use anyhow::Result;
use plotters::{
  coord::Shift,
  prelude::*,
  style::text_anchor::{HPos, Pos, VPos},
};

const PANEL_H: u32 = 480;
const MIN_PANEL_W: u32 = 480;
const CATEGORY_W: u32 = 64;
const FONT: &str = "sans-serif";

#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
  pub series: String,
  pub value: f64,
}

/// The bars drawn side by side above one x tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
  pub label: String,
  pub bars: Vec<Bar>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
  pub x_label: String,
  pub y_label: String,
  pub categories: Vec<Category>,
}

/// A grid of panels sharing one value axis range.
#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
  pub title: String,
  pub columns: usize,
  pub panels: Vec<Panel>,
}

impl Chart {
  /// Renders the chart as a PNG into `path`.
  pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let path = path.as_ref();
    let columns = self.columns.max(1);
    let rows = self.panels.len().div_ceil(columns).max(1);
    let max_categories = self.panels.iter().map(|panel| panel.categories.len()).max().unwrap_or(0) as u32;
    let panel_w = MIN_PANEL_W.max(CATEGORY_W * max_categories);

    let root = BitMapBackend::new(path, (panel_w * columns as u32, PANEL_H * rows as u32)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = match self.title.as_str() {
      "" => root,
      title => root.titled(title, (FONT, 24))?,
    };

    let series = self.series();
    let range = self.range();
    for (panel, area) in self.panels.iter().zip(root.split_evenly((rows, columns)).iter()) {
      draw_panel(area, panel, &series, range)?;
    }

    root.present()?;
    log::info!("wrote {path:?}");

    Ok(())
  }

  /// Series names in order of first appearance.
  fn series(&self) -> Vec<&str> {
    let mut series: Vec<&str> = Vec::new();
    for bar in self.bars() {
      if !series.contains(&bar.series.as_str()) {
        series.push(&bar.series);
      }
    }

    series
  }

  fn bars(&self) -> impl Iterator<Item = &Bar> {
    self
      .panels
      .iter()
      .flat_map(|panel| &panel.categories)
      .flat_map(|category| &category.bars)
  }

  /// Whole decades around the drawable values.
  fn range(&self) -> (f64, f64) {
    let values = self.bars().map(|bar| bar.value).filter(|value| drawable(*value));
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| (lo.min(value), hi.max(value)));

    if lo > hi {
      return (1.0, 10.0);
    }

    let lo = lo.log10().floor() as i32;
    let hi = (hi.log10().ceil() as i32).max(lo + 1);

    (10f64.powi(lo), 10f64.powi(hi))
  }
}

fn draw_panel(
  area: &DrawingArea<BitMapBackend, Shift>,
  panel: &Panel,
  series: &[&str],
  (lo, hi): (f64, f64),
) -> Result<()> {
  let labels: Vec<&str> = panel.categories.iter().map(|category| category.label.as_str()).collect();
  let count = labels.len().max(1);
  let label_of = |x: &f64| {
    let index = x.round();
    match labels.get(index as usize) {
      Some(label) if (x - index).abs() < 1e-6 && index >= 0.0 => label.to_string(),
      _ => String::new(),
    }
  };

  let mut chart = ChartBuilder::on(area)
    .margin(12)
    .x_label_area_size(120)
    .y_label_area_size(64)
    .build_cartesian_2d(-0.5..count as f64 - 0.5, (lo..hi).log_scale())?;

  chart
    .configure_mesh()
    .disable_x_mesh()
    .x_labels(count)
    .x_label_formatter(&label_of)
    .x_label_style((FONT, 13).into_font().transform(FontTransform::Rotate90))
    .x_desc(panel.x_label.as_str())
    .y_desc(panel.y_label.as_str())
    .draw()?;

  let present: Vec<&str> = series
    .iter()
    .copied()
    .filter(|name| panel.categories.iter().flat_map(|c| &c.bars).any(|bar| bar.series == *name))
    .collect();
  let width = 0.8 / present.len().max(1) as f64;
  let value_style = TextStyle::from((FONT, 11).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));

  for (position, name) in present.iter().enumerate() {
    let colour = Palette99::pick(series.iter().position(|s| s == name).unwrap_or(0)).to_rgba();
    let bars: Vec<(f64, f64)> = panel
      .categories
      .iter()
      .enumerate()
      .flat_map(|(i, category)| {
        let x = i as f64 - 0.4 + position as f64 * width;
        category
          .bars
          .iter()
          .filter(|bar| bar.series == *name && drawable(bar.value))
          .map(move |bar| (x, bar.value))
      })
      .collect();

    chart
      .draw_series(bars.iter().map(|&(x, value)| Rectangle::new([(x, lo), (x + width, value)], colour.filled())))?
      .label(*name)
      .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], colour.filled()));
    chart.draw_series(
      bars
        .iter()
        .map(|&(x, value)| Text::new(format!("{value:.1}"), (x + width / 2.0, value), value_style.clone())),
    )?;
  }

  chart
    .configure_series_labels()
    .position(SeriesLabelPosition::UpperLeft)
    .background_style(WHITE.mix(0.8))
    .border_style(BLACK)
    .draw()?;

  Ok(())
}

/// Only positive values have a place on a logarithmic axis.
fn drawable(value: f64) -> bool {
  value.is_finite() && value > 0.0
}
