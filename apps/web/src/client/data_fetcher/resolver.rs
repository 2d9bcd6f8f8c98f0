use std::sync::Arc;

use super::{DataFetcher, RequestContext, ResponseContext};

/// リクエストごとにデータフェッチャーを生成するトレイト
///
/// Layout Service の設定で指定すると、既定のフェッチャーより優先される。
/// 受け取ったハンドルをどう使うか（ヘッダー中継、認証ヘッダーの付与）は実装に任せる。
pub trait DataFetcherResolver: Send + Sync {
    fn resolve(
        &self,
        req: Option<&RequestContext>,
        res: Option<&ResponseContext>,
    ) -> Arc<dyn DataFetcher>;
}
