use lopdf::content::{Content, Operation};

use crate::pdf::content_stream::{Matrix, Rect, operand_to_f64};

/// パスの最初の描画セグメントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `l` 直線
    Line,
    /// `c` / `v` / `y` ベジェ曲線
    Curve,
    /// `re` 矩形
    Rect,
}

/// DeviceRGB相当の色（各成分 0.0..=1.0）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub const BLACK: RgbColor = RgbColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    fn gray(v: f64) -> Self {
        Self::new(v, v, v)
    }

    fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self::new((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
    }

    /// 成分数（1=Gray, 3=RGB, 4=CMYK）に応じて色を解釈する。
    fn from_components(vals: &[f64]) -> Option<Self> {
        match *vals {
            [g] => Some(Self::gray(g)),
            [r, g, b] => Some(Self::new(r, g, b)),
            [c, m, y, k] => Some(Self::cmyk(c, m, y, k)),
            _ => None,
        }
    }
}

/// ページ上に描画された1つのパス。
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPath {
    pub kind: PathKind,
    /// 最後のセグメントが `h`（または s/b/b* による暗黙のclose）か
    pub closed: bool,
    /// ストローク色。塗りのみのパスは `None`（塗り色は分類に使わない）
    pub color: Option<RgbColor>,
    pub stroked: bool,
    pub filled: bool,
    /// ページ空間での線幅
    pub line_width: f64,
    /// ページ空間でのバウンディングボックス（ストローク時は線幅の半分だけ拡張）
    pub rect: Rect,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    stroke_color: RgbColor,
    line_width: f64,
}

impl GraphicsState {
    fn new() -> Self {
        Self {
            ctm: Matrix::identity(),
            stroke_color: RgbColor::BLACK,
            line_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    MoveTo,
    LineTo,
    CurveTo,
    Rect,
    Close,
}

/// 構築中のパス（m/l/c/v/y/re/h）
#[derive(Default)]
struct PathBuilder {
    segments: Vec<Segment>,
    bounds: Option<Rect>,
    /// ユーザー空間でのカレントポイント（`v` の第1制御点に使う）
    current: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
}

impl PathBuilder {
    fn add_point(&mut self, ctm: &Matrix, x: f64, y: f64) {
        let (px, py) = ctm.transform_point(x, y);
        match self.bounds.as_mut() {
            Some(bounds) => bounds.include_point(px, py),
            None => self.bounds = Some(Rect::from_point(px, py)),
        }
    }

    fn move_to(&mut self, ctm: &Matrix, x: f64, y: f64) {
        self.segments.push(Segment::MoveTo);
        self.add_point(ctm, x, y);
        self.current = Some((x, y));
        self.subpath_start = Some((x, y));
    }

    fn line_to(&mut self, ctm: &Matrix, x: f64, y: f64) {
        self.segments.push(Segment::LineTo);
        self.add_point(ctm, x, y);
        self.current = Some((x, y));
    }

    fn curve_to(&mut self, ctm: &Matrix, points: [(f64, f64); 3]) {
        self.segments.push(Segment::CurveTo);
        for (x, y) in points {
            self.add_point(ctm, x, y);
        }
        self.current = Some(points[2]);
    }

    fn rect(&mut self, ctm: &Matrix, x: f64, y: f64, w: f64, h: f64) {
        self.segments.push(Segment::Rect);
        for (px, py) in [(x, y), (x + w, y), (x + w, y + h), (x, y + h)] {
            self.add_point(ctm, px, py);
        }
        self.current = Some((x, y));
        self.subpath_start = Some((x, y));
    }

    fn close(&mut self) {
        if !self.segments.is_empty() {
            self.segments.push(Segment::Close);
            self.current = self.subpath_start;
        }
    }

    /// 塗り/ストロークオペレータでパスを確定し、VectorPathを生成する。
    ///
    /// 描画セグメントを持たないパス（mのみ等）は `None` を返す。
    fn finish(self, gs: &GraphicsState, stroked: bool, filled: bool) -> Option<VectorPath> {
        let kind = self.segments.iter().find_map(|s| match s {
            Segment::LineTo => Some(PathKind::Line),
            Segment::CurveTo => Some(PathKind::Curve),
            Segment::Rect => Some(PathKind::Rect),
            Segment::MoveTo | Segment::Close => None,
        })?;
        let bounds = self.bounds?;
        let closed = self.segments.last() == Some(&Segment::Close);

        let line_width = gs.line_width * gs.ctm.length_scale();
        let rect = if stroked {
            bounds.inflate(line_width / 2.0)
        } else {
            bounds
        };

        let color = stroked.then_some(gs.stroke_color);

        Some(VectorPath {
            kind,
            closed,
            color,
            stroked,
            filled,
            line_width,
            rect,
        })
    }
}

/// コンテンツストリームを解析し、描画されたパスを描画順に返す。
///
/// q/Q によるグラフィックス状態スタック、cm によるCTM、線幅、
/// ストローク色（Gray/RGB/CMYK）を追跡する。塗り色は追跡しない。
/// Form XObject (Do) の中身は展開しない。
pub fn extract_vector_paths(content_bytes: &[u8]) -> crate::error::Result<Vec<VectorPath>> {
    // 空バイト列の場合、lopdfのパーサがエラーを返す可能性があるため特別扱い
    if content_bytes.is_empty() {
        return Ok(Vec::new());
    }

    let content = Content::decode(content_bytes)
        .map_err(|e| crate::error::HighlightError::content_stream(e.to_string()))?;

    let mut gs_stack: Vec<GraphicsState> = Vec::new();
    let mut gs = GraphicsState::new();
    let mut builder = PathBuilder::default();
    let mut paths: Vec<VectorPath> = Vec::new();

    for op in &content.operations {
        match op.operator.as_str() {
            // --- グラフィックス状態 ---
            "q" => gs_stack.push(gs.clone()),
            "Q" => {
                if let Some(saved) = gs_stack.pop() {
                    gs = saved;
                }
            }
            "cm" => {
                if let Ok(m) = Matrix::from_operands(&op.operands) {
                    gs.ctm = m.multiply(&gs.ctm);
                }
            }
            "w" => {
                if let Some([w]) = numbers::<1>(op) {
                    gs.line_width = w;
                }
            }

            // --- 色 ---
            "RG" | "G" | "K" | "SC" | "SCN" => {
                if let Some(color) = color_operands(op) {
                    gs.stroke_color = color;
                }
            }
            // 色空間の切り替えで初期色（黒）に戻る
            "CS" => gs.stroke_color = RgbColor::BLACK,

            // --- パス構築 ---
            "m" => {
                if let Some([x, y]) = numbers::<2>(op) {
                    builder.move_to(&gs.ctm, x, y);
                }
            }
            "l" => {
                if let Some([x, y]) = numbers::<2>(op) {
                    builder.line_to(&gs.ctm, x, y);
                }
            }
            "c" => {
                if let Some([x1, y1, x2, y2, x3, y3]) = numbers::<6>(op) {
                    builder.curve_to(&gs.ctm, [(x1, y1), (x2, y2), (x3, y3)]);
                }
            }
            "v" => {
                if let Some([x2, y2, x3, y3]) = numbers::<4>(op) {
                    let (x1, y1) = builder.current.unwrap_or((x2, y2));
                    builder.curve_to(&gs.ctm, [(x1, y1), (x2, y2), (x3, y3)]);
                }
            }
            "y" => {
                if let Some([x1, y1, x3, y3]) = numbers::<4>(op) {
                    builder.curve_to(&gs.ctm, [(x1, y1), (x3, y3), (x3, y3)]);
                }
            }
            "re" => {
                if let Some([x, y, w, h]) = numbers::<4>(op) {
                    builder.rect(&gs.ctm, x, y, w, h);
                }
            }
            "h" => builder.close(),

            // --- パス描画 ---
            "S" => paint(&mut builder, &gs, &mut paths, true, false),
            "s" => {
                builder.close();
                paint(&mut builder, &gs, &mut paths, true, false);
            }
            "f" | "F" | "f*" => paint(&mut builder, &gs, &mut paths, false, true),
            "B" | "B*" => paint(&mut builder, &gs, &mut paths, true, true),
            "b" | "b*" => {
                builder.close();
                paint(&mut builder, &gs, &mut paths, true, true);
            }
            "n" => builder = PathBuilder::default(),

            _ => {}
        }
    }

    Ok(paths)
}

fn paint(
    builder: &mut PathBuilder,
    gs: &GraphicsState,
    paths: &mut Vec<VectorPath>,
    stroked: bool,
    filled: bool,
) {
    let finished = std::mem::take(builder);
    if let Some(path) = finished.finish(gs, stroked, filled) {
        paths.push(path);
    }
}

/// オペランドがちょうどN個の数値であれば配列として返す。
fn numbers<const N: usize>(op: &Operation) -> Option<[f64; N]> {
    if op.operands.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(&op.operands) {
        *slot = operand_to_f64(obj).ok()?;
    }
    Some(out)
}

/// 色オペレータのオペランドを解釈する。パターン名付きのSCN/scnは無視する。
fn color_operands(op: &Operation) -> Option<RgbColor> {
    let vals: Vec<f64> = op
        .operands
        .iter()
        .map(operand_to_f64)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    RgbColor::from_components(&vals)
}
