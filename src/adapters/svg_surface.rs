//! SVG rendering surfaces.
//!
//! Each surface renders its series into one standalone SVG document, clipped
//! to the visible time range handed to [`RenderSurface::encode`].

use crate::domain::chart::series::{
    PaneKind, PriceScale, SeriesData, SeriesId, SeriesKind, SeriesSpec,
};
use crate::domain::viewport::VisibleRange;
use crate::ports::render_port::{RenderSurface, SurfaceFactory};

const PADDING: f64 = 40.0;
/// Share of the plot height given to overlay-scale series (volume).
const OVERLAY_FRACTION: f64 = 0.2;

pub struct SvgSurfaceFactory;

impl SurfaceFactory for SvgSurfaceFactory {
    fn create(&self, kind: PaneKind, width: u32, height: u32) -> Box<dyn RenderSurface> {
        Box::new(SvgSurface::new(kind, width, height))
    }
}

pub struct SvgSurface {
    kind: PaneKind,
    width: u32,
    height: u32,
    series: Vec<(SeriesSpec, SeriesData)>,
    released: bool,
}

#[derive(Debug, Clone, Copy)]
struct YScale {
    min: f64,
    max: f64,
    top: f64,
    height: f64,
}

impl YScale {
    fn y(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 {
            self.top + self.height - (value - self.min) / range * self.height
        } else {
            self.top + self.height / 2.0
        }
    }

    fn baseline(&self) -> f64 {
        self.y(0.0_f64.clamp(self.min, self.max))
    }
}

struct XScale {
    range: VisibleRange,
    left: f64,
    width: f64,
}

impl XScale {
    fn x(&self, time: i64) -> f64 {
        let span = self.range.span();
        if span > 0 {
            self.left + (time - self.range.start) as f64 / span as f64 * self.width
        } else {
            self.left + self.width / 2.0
        }
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

impl SvgSurface {
    pub fn new(kind: PaneKind, width: u32, height: u32) -> Self {
        Self {
            kind,
            width,
            height,
            series: Vec::new(),
            released: false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn data_range(&self) -> Option<VisibleRange> {
        let mut spans = self.series.iter().filter_map(|(_, data)| data.time_bounds());
        let first = spans.next()?;
        let (start, end) = spans.fold(first, |(s, e), (a, b)| (s.min(a), e.max(b)));
        Some(VisibleRange::new(start, end))
    }

    /// Value extent of every series on `scale` inside `range`.
    fn value_bounds(&self, range: VisibleRange, scale: PriceScale) -> Option<(f64, f64)> {
        bounds(
            self.series
                .iter()
                .filter(|(spec, _)| spec.scale == scale)
                .flat_map(|(_, data)| visible_values(data, range)),
        )
    }

    fn y_scale(&self, range: VisibleRange, scale: PriceScale, top: f64, height: f64) -> YScale {
        match scale {
            PriceScale::Fixed { min, max } => YScale {
                min,
                max,
                top,
                height,
            },
            PriceScale::Overlay => {
                let (_, max) = self.value_bounds(range, scale).unwrap_or((0.0, 1.0));
                let band = height * OVERLAY_FRACTION;
                YScale {
                    min: 0.0,
                    max,
                    top: top + height - band,
                    height: band,
                }
            }
            PriceScale::Right => {
                let (min, max) = self.value_bounds(range, scale).unwrap_or((0.0, 1.0));
                YScale {
                    min,
                    max,
                    top,
                    height,
                }
            }
        }
    }
}

fn visible_values(data: &SeriesData, range: VisibleRange) -> Vec<f64> {
    match data {
        SeriesData::Ohlc(points) => points
            .iter()
            .filter(|p| range.contains(p.time))
            .flat_map(|p| [p.low, p.high])
            .collect(),
        SeriesData::Values(points) => points
            .iter()
            .filter(|p| range.contains(p.time))
            .map(|p| p.value)
            .collect(),
    }
}

fn render_series(
    spec: &SeriesSpec,
    data: &SeriesData,
    xs: &XScale,
    ys: &YScale,
    bar_width: f64,
) -> Vec<String> {
    let range = xs.range;
    match (spec.kind, data) {
        (SeriesKind::Candlestick, SeriesData::Ohlc(points)) => points
            .iter()
            .filter(|p| range.contains(p.time))
            .map(|p| {
                let x = xs.x(p.time);
                let color = if p.is_bullish() {
                    spec.color
                } else {
                    spec.down_color.unwrap_or(spec.color)
                };
                let top = ys.y(p.open.max(p.close));
                let body = (ys.y(p.open.min(p.close)) - top).max(1.0);
                format!(
                    r#"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{color}"/><rect x="{:.1}" y="{top:.1}" width="{bar_width:.1}" height="{body:.1}" fill="{color}"/>"#,
                    ys.y(p.high),
                    ys.y(p.low),
                    x - bar_width / 2.0,
                )
            })
            .collect(),
        (SeriesKind::Line, SeriesData::Values(points)) => {
            let coords: Vec<String> = points
                .iter()
                .filter(|p| range.contains(p.time))
                .map(|p| format!("{:.1},{:.1}", xs.x(p.time), ys.y(p.value)))
                .collect();
            if coords.is_empty() {
                return Vec::new();
            }
            vec![format!(
                r#"<polyline fill="none" stroke="{}" stroke-width="{}" points="{}"/>"#,
                spec.color,
                spec.line_width,
                coords.join(" ")
            )]
        }
        (SeriesKind::Histogram, SeriesData::Values(points)) => {
            let base = ys.baseline();
            points
                .iter()
                .filter(|p| range.contains(p.time))
                .map(|p| {
                    let y = ys.y(p.value);
                    format!(
                        r#"<rect x="{:.1}" y="{:.1}" width="{bar_width:.1}" height="{:.1}" fill="{}"/>"#,
                        xs.x(p.time) - bar_width / 2.0,
                        y.min(base),
                        (base - y).abs(),
                        spec.color
                    )
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

impl RenderSurface for SvgSurface {
    fn add_series(&mut self, spec: SeriesSpec) -> SeriesId {
        self.series.push((spec, SeriesData::Values(Vec::new())));
        SeriesId(self.series.len() - 1)
    }

    fn set_series_data(&mut self, id: SeriesId, data: SeriesData) {
        if let Some(entry) = self.series.get_mut(id.0) {
            entry.1 = data;
        }
    }

    fn set_series_spec(&mut self, id: SeriesId, spec: SeriesSpec) {
        if let Some(entry) = self.series.get_mut(id.0) {
            entry.0 = spec;
        }
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn encode(&self, visible: Option<VisibleRange>) -> String {
        let width = self.width as f64;
        let height = self.height as f64;
        let pane = match self.kind {
            PaneKind::Main => "main",
            PaneKind::Oscillator => "oscillator",
        };

        let mut elements = vec![format!(
            r#"<rect x="0" y="0" width="{}" height="{}" fill="white"/>"#,
            self.width, self.height
        )];

        match visible.or_else(|| self.data_range()) {
            None => elements.push(format!(
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">No data</text>"#,
                width / 2.0,
                height / 2.0
            )),
            Some(range) => {
                let plot_width = (width - 2.0 * PADDING).max(1.0);
                let plot_height = (height - 2.0 * PADDING).max(1.0);
                let xs = XScale {
                    range,
                    left: PADDING,
                    width: plot_width,
                };
                let count = self
                    .series
                    .first()
                    .map_or(0, |(_, data)| visible_values(data, range).len())
                    .max(1);
                let bar_width = (plot_width / count as f64 * 0.6).clamp(1.0, 12.0);

                for (spec, data) in &self.series {
                    let ys = self.y_scale(range, spec.scale, PADDING, plot_height);
                    elements.extend(render_series(spec, data, &xs, &ys, bar_width));
                }
                for (i, (spec, _)) in self.series.iter().enumerate() {
                    elements.push(format!(
                        r#"<text x="{:.1}" y="{:.1}" font-size="11" fill="{}">{}</text>"#,
                        PADDING,
                        14.0 + i as f64 * 13.0,
                        spec.color,
                        spec.label
                    ));
                }
            }
        }

        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" data-pane=\"{pane}\">\n{}\n</svg>\n",
            elements.join("\n"),
            w = self.width,
            h = self.height,
        )
    }

    fn release(&mut self) {
        self.series.clear();
        self.released = true;
    }
}
