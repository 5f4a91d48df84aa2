/// multipart デコーダーの制限設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartLimits {
    /// 最大バッファサイズ (デフォルト: 16MB)
    ///
    /// パーサーが未処理のまま保持できるバイト数。
    /// 一つのパートは区切り行が見つかるまでバッファに溜まるため、
    /// `max_part_size` 以上にしておく必要がある。
    pub max_buffer_size: usize,
    /// 最大パート数 (デフォルト: 1000)
    pub max_parts: usize,
    /// パートヘッダーブロックの最大サイズ (デフォルト: 8KB)
    pub max_header_size: usize,
    /// 最大パートサイズ (ヘッダーを含む、デフォルト: 10MB)
    pub max_part_size: usize,
}

impl Default for MultipartLimits {
    fn default() -> Self {
        Self {
            max_buffer_size: 16 * 1024 * 1024, // 16MB
            max_parts: 1000,
            max_header_size: 8 * 1024,       // 8KB
            max_part_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl MultipartLimits {
    /// 制限なしの設定を作成
    ///
    /// ボディ全体がすでにメモリ上にある `MultipartDecoder` のデフォルト。
    pub fn unlimited() -> Self {
        Self {
            max_buffer_size: usize::MAX,
            max_parts: usize::MAX,
            max_header_size: usize::MAX,
            max_part_size: usize::MAX,
        }
    }
}
