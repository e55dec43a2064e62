use lopdf::{Dictionary, Document, Object, ObjectId};
use rayon::prelude::*;
use tracing::warn;

use crate::pdf::content_stream::{Rect, operand_to_f64};
use crate::pdf::page::PageGeometry;
use crate::pdf::paths::{VectorPath, extract_vector_paths};

/// Parentをたどる深さの上限（循環参照対策）
const MAX_INHERITANCE_DEPTH: usize = 32;

pub struct PdfReader {
    doc: Document,
}

impl PdfReader {
    /// メモリ上のPDFバイト列からPdfReaderを作成する。
    ///
    /// lopdfが解析できない入力は `MalformedDocument` として扱う。
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    /// 内部のlopdf Documentへの参照を返す。
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// ストリーム書き換え用に内部のDocumentへの可変参照を返す。
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// ページ数を返す。
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// 指定ページ(1-indexed)のコンテンツストリームをバイト列として返す。
    /// 複数のContentストリームがある場合は結合して返す。
    pub fn page_content_stream(&self, page_num: u32) -> crate::error::Result<Vec<u8>> {
        let page_id = self.get_page_id(page_num)?;
        self.doc
            .get_page_content(page_id)
            .map_err(|e| crate::error::HighlightError::content_stream(e.to_string()))
    }

    /// 指定ページ(1-indexed)に描画されたパスを描画順に返す。
    pub fn page_vector_paths(&self, page_num: u32) -> crate::error::Result<Vec<VectorPath>> {
        let content = self.page_content_stream(page_num)?;
        extract_vector_paths(&content)
    }

    /// 全ページのパスをページ順に返す。
    ///
    /// 解析できないページは警告を出して空のパス列とする。
    /// `parallel` が true の場合はrayonでページ単位に並列解析する。
    pub fn all_vector_paths(&self, parallel: bool) -> Vec<Vec<VectorPath>> {
        // コンテンツの取得は逐次、オペレータ解析のみ並列に行う
        let contents: Vec<(u32, crate::error::Result<Vec<u8>>)> = self
            .doc
            .get_pages()
            .into_iter()
            .map(|(page_num, page_id)| {
                let content = self
                    .doc
                    .get_page_content(page_id)
                    .map_err(|e| crate::error::HighlightError::content_stream(e.to_string()));
                (page_num, content)
            })
            .collect();

        let decode = |(page_num, content): &(u32, crate::error::Result<Vec<u8>>)| {
            let paths = match content {
                Ok(bytes) => extract_vector_paths(bytes),
                Err(e) => Err(crate::error::HighlightError::content_stream(e.to_string())),
            };
            paths.unwrap_or_else(|e| {
                warn!(page = *page_num, error = %e, "failed to decode page paths");
                Vec::new()
            })
        };

        if parallel {
            contents.par_iter().map(decode).collect()
        } else {
            contents.iter().map(decode).collect()
        }
    }

    /// 指定ページ(1-indexed)の表示領域と回転を返す。
    ///
    /// MediaBox / CropBox / Rotate はPageツリーの祖先から継承される。
    /// CropBoxはMediaBoxとの共通部分に切り詰め、Rotateは90の倍数以外を0とみなす。
    pub fn page_geometry(&self, page_num: u32) -> crate::error::Result<PageGeometry> {
        let page_id = self.get_page_id(page_num)?;
        self.geometry_of(page_id)
    }

    /// 全ページの表示領域をページ順に返す。読めないページは既定値とする。
    pub fn all_page_geometries(&self) -> Vec<PageGeometry> {
        self.doc
            .get_pages()
            .into_iter()
            .map(|(page_num, page_id)| {
                self.geometry_of(page_id).unwrap_or_else(|e| {
                    warn!(page = page_num, error = %e, "page geometry unreadable, assuming Letter");
                    PageGeometry::default()
                })
            })
            .collect()
    }

    fn geometry_of(&self, page_id: ObjectId) -> crate::error::Result<PageGeometry> {
        let page_dict = self.doc.get_dictionary(page_id)?;

        let media_box = self
            .inherited_attribute(page_dict, b"MediaBox")?
            .ok_or_else(|| crate::error::HighlightError::malformed("MediaBox not found"))?;
        let media_box = self.box_rect(&media_box)?;

        let crop_box = match self.inherited_attribute(page_dict, b"CropBox")? {
            Some(obj) => {
                let crop = self.box_rect(&obj)?;
                crop.intersect(&media_box).unwrap_or(media_box)
            }
            None => media_box,
        };
        if crop_box.width() <= 0.0 || crop_box.height() <= 0.0 {
            return Err(crate::error::HighlightError::malformed(
                "page box has non-positive dimensions",
            ));
        }

        let rotation = match self.inherited_attribute(page_dict, b"Rotate")? {
            Some(Object::Integer(r)) if r % 90 == 0 => r.rem_euclid(360) as u16,
            _ => 0,
        };

        Ok(PageGeometry { crop_box, rotation })
    }

    /// ページ辞書から属性を探す（Parent経由の継承も考慮）。参照は解決して返す。
    fn inherited_attribute(
        &self,
        page_dict: &Dictionary,
        key: &[u8],
    ) -> crate::error::Result<Option<Object>> {
        let mut dict = page_dict;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(obj) = dict.get(key) {
                return Ok(Some(self.resolve(obj)?.clone()));
            }
            match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent_id) => dict = self.doc.get_dictionary(parent_id)?,
                Err(_) => return Ok(None),
            }
        }
        Err(crate::error::HighlightError::malformed(
            "page tree inheritance too deep",
        ))
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> crate::error::Result<&'a Object> {
        match obj {
            Object::Reference(id) => Ok(self.doc.get_object(*id)?),
            other => Ok(other),
        }
    }

    /// [x0 y0 x1 y1] 形式の矩形配列を読む。要素が参照の場合も解決する。
    fn box_rect(&self, obj: &Object) -> crate::error::Result<Rect> {
        let values = obj.as_array()?;
        let [x0, y0, x1, y1] = values.as_slice() else {
            return Err(crate::error::HighlightError::malformed(
                "page box must have four numbers",
            ));
        };
        let num = |o: &Object| -> crate::error::Result<f64> {
            operand_to_f64(self.resolve(o)?)
                .map_err(|e| crate::error::HighlightError::malformed(e.to_string()))
        };
        Ok(Rect::new(num(x0)?, num(y0)?, num(x1)?, num(y1)?))
    }

    /// 現在のDocumentをPDFバイト列として書き出す。
    pub fn save_to_bytes(&mut self) -> crate::error::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| crate::error::HighlightError::pdf_write(e.to_string()))?;
        Ok(buf)
    }

    /// ページ番号(1-indexed)からObjectIdを取得する。
    fn get_page_id(&self, page_num: u32) -> crate::error::Result<lopdf::ObjectId> {
        let pages = self.doc.get_pages();
        pages.get(&page_num).copied().ok_or_else(|| {
            crate::error::HighlightError::content_stream(format!("page {} not found", page_num))
        })
    }
}
