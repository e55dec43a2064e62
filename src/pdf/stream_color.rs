// ハイライト色（黄色）シグネチャのストリーム内置換

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use lopdf::{Document, Object, ObjectId, Stream};
use tracing::{debug, info, warn};

use crate::error::HighlightError;

/// 塗り色を黄色に設定するオペレータ列
pub const FILL_YELLOW: &[u8] = b"0.996078 0.992157 0.376471 rg";
/// ストローク色を黄色に設定するオペレータ列
pub const STROKE_YELLOW: &[u8] = b"0.996078 0.992157 0.376471 RG";
pub const FILL_WHITE: &[u8] = b"1 1 1 rg";
pub const STROKE_WHITE: &[u8] = b"1 1 1 RG";

/// オブジェクト番号で引けるストリームのバイト列の集合。
///
/// `stream_bytes` はフィルタを解いたバイト列を返し、
/// `set_stream_bytes` は元のフィルタで再エンコードして書き戻す。
pub trait ContentObjects {
    fn object_ids(&self) -> Vec<ObjectId>;

    fn is_stream(&self, id: ObjectId) -> bool;

    /// 演算子列として扱えないフィルタ（画像コーデック等）の場合は `Ok(None)`。
    fn stream_bytes(&self, id: ObjectId) -> crate::error::Result<Option<Vec<u8>>>;

    fn set_stream_bytes(&mut self, id: ObjectId, bytes: Vec<u8>) -> crate::error::Result<()>;
}

/// 置換処理の集計
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeReport {
    /// 走査したストリーム数
    pub scanned: usize,
    /// 書き換えたストリーム数
    pub rewritten: usize,
    /// デコード/再エンコードに失敗して飛ばしたストリーム数
    pub skipped: usize,
}

/// 全ストリームの黄色シグネチャを白に置き換える。
///
/// 1つのストリームの失敗はそのストリームだけを飛ばし、処理全体は中断しない。
/// 2回目以降の実行は何も変更しない。
pub fn normalize_highlight_color<S: ContentObjects + ?Sized>(store: &mut S) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for id in store.object_ids() {
        if !store.is_stream(id) {
            continue;
        }
        report.scanned += 1;

        let bytes = match store.stream_bytes(id) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(object = ?id, "stream filter not rewritable, skipping");
                continue;
            }
            Err(e) => {
                warn!(object = ?id, error = %e, "failed to decode stream, skipping");
                report.skipped += 1;
                continue;
            }
        };

        let Some(rewritten) = replace_highlight_signatures(&bytes) else {
            continue;
        };

        match store.set_stream_bytes(id, rewritten) {
            Ok(()) => report.rewritten += 1,
            Err(e) => {
                warn!(object = ?id, error = %e, "failed to rewrite stream, skipping");
                report.skipped += 1;
            }
        }
    }

    info!(
        scanned = report.scanned,
        rewritten = report.rewritten,
        skipped = report.skipped,
        "highlight color normalized"
    );
    report
}

/// バイト列に黄色シグネチャ（塗り/ストロークのいずれか）があれば、
/// 両方を白に置換した結果を返す。どちらも無ければ `None`。
pub fn replace_highlight_signatures(bytes: &[u8]) -> Option<Vec<u8>> {
    if !contains(bytes, FILL_YELLOW) && !contains(bytes, STROKE_YELLOW) {
        return None;
    }
    let replaced = replace_all(bytes, FILL_YELLOW, FILL_WHITE);
    Some(replace_all(&replaced, STROKE_YELLOW, STROKE_WHITE))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// 重ならない出現を左から順にすべて置換する。
fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(replacement);
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

/// 書き換えに対応するストリームのエンコーディング
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEncoding {
    Plain,
    Flate,
}

/// ストリーム辞書のFilterを調べる。対応外（画像コーデック、
/// 複数段フィルタ、DecodeParms付き）の場合は `None`。
fn stream_encoding(stream: &Stream) -> Option<StreamEncoding> {
    let filter = match stream.dict.get(b"Filter") {
        Ok(filter) => filter,
        Err(_) => return Some(StreamEncoding::Plain),
    };

    if stream.dict.get(b"DecodeParms").is_ok() {
        return None;
    }

    let name: &[u8] = match filter {
        Object::Name(name) => name,
        Object::Array(arr) if arr.len() == 1 => arr[0].as_name().ok()?,
        Object::Array(arr) if arr.is_empty() => return Some(StreamEncoding::Plain),
        _ => return None,
    };

    match name {
        b"FlateDecode" | b"Fl" => Some(StreamEncoding::Flate),
        _ => None,
    }
}

fn get_stream(doc: &Document, id: ObjectId) -> crate::error::Result<&Stream> {
    match doc.objects.get(&id) {
        Some(Object::Stream(stream)) => Ok(stream),
        _ => Err(HighlightError::stream_rewrite(format!(
            "object {:?} is not a stream",
            id
        ))),
    }
}

/// zlibで展開
fn flate_decode(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| HighlightError::stream_rewrite(format!("Flate decode error: {}", e)))?;
    Ok(out)
}

/// zlibで圧縮
fn flate_encode(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| HighlightError::stream_rewrite(format!("Flate encode error: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| HighlightError::stream_rewrite(format!("Flate encode error: {}", e)))
}

impl ContentObjects for Document {
    fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    fn is_stream(&self, id: ObjectId) -> bool {
        matches!(self.objects.get(&id), Some(Object::Stream(_)))
    }

    fn stream_bytes(&self, id: ObjectId) -> crate::error::Result<Option<Vec<u8>>> {
        let stream = get_stream(self, id)?;
        match stream_encoding(stream) {
            Some(StreamEncoding::Plain) => Ok(Some(stream.content.clone())),
            Some(StreamEncoding::Flate) => flate_decode(&stream.content).map(Some),
            None => Ok(None),
        }
    }

    fn set_stream_bytes(&mut self, id: ObjectId, bytes: Vec<u8>) -> crate::error::Result<()> {
        let encoding = stream_encoding(get_stream(self, id)?).ok_or_else(|| {
            HighlightError::stream_rewrite(format!(
                "object {:?} has a filter that cannot be re-encoded",
                id
            ))
        })?;

        let content = match encoding {
            StreamEncoding::Plain => bytes,
            StreamEncoding::Flate => flate_encode(&bytes)?,
        };

        let Some(Object::Stream(stream)) = self.objects.get_mut(&id) else {
            return Err(HighlightError::stream_rewrite(format!(
                "object {:?} is not a stream",
                id
            )));
        };
        // set_content は /Length も更新する
        stream.set_content(content);
        Ok(())
    }
}
