//! # ヘッダー中継
//!
//! 受信リクエストの一部ヘッダーを Sitecore へ転送し、
//! Sitecore が返した `set-cookie` をページレスポンスへ書き戻す。
//!
//! | 方向 | ヘッダー |
//! |------|----------|
//! | 受信 → Sitecore | `cookie`, `referer`, `user-agent`, 接続元アドレス（`X-Forwarded-For`） |
//! | Sitecore → 応答 | `set-cookie` |
//!
//! 状態はリクエスト単位で、アダプタ側には残らない。

use std::{
    net::IpAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use http::{
    HeaderMap,
    HeaderName,
    HeaderValue,
    header::{COOKIE, REFERER, SET_COOKIE, USER_AGENT},
};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// 中継対象の受信ヘッダー
const RELAYED_REQUEST_HEADERS: [HeaderName; 3] = [COOKIE, REFERER, USER_AGENT];

/// 受信リクエストのハンドル
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub headers:     HeaderMap,
    pub remote_addr: Option<IpAddr>,
}

impl RequestContext {
    pub fn new(headers: HeaderMap, remote_addr: Option<IpAddr>) -> Self {
        Self {
            headers,
            remote_addr,
        }
    }
}

/// 送信レスポンスのハンドル
///
/// フェッチ中に書き込まれたヘッダーを保持し、ハンドラがレスポンスへ反映する。
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    headers: Arc<Mutex<HeaderMap>>,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HeaderMap> {
        self.headers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `set-cookie` を置き換える
    pub fn set_cookies(&self, values: Vec<HeaderValue>) {
        let mut headers = self.lock();
        headers.remove(SET_COOKIE);
        for value in values {
            headers.append(SET_COOKIE, value);
        }
    }

    /// 書き込まれたヘッダーのスナップショット
    pub fn headers(&self) -> HeaderMap {
        self.lock().clone()
    }

    /// 書き込まれたヘッダーを `target` に反映する
    ///
    /// 同名のヘッダーは置き換える。何も書き込まれていなければ `target` は変更しない。
    pub fn apply_to(&self, target: &mut HeaderMap) {
        let headers = self.lock();
        for name in headers.keys() {
            target.remove(name);
            for value in headers.get_all(name) {
                target.append(name.clone(), value.clone());
            }
        }
    }
}

/// リクエスト単位のヘッダー中継
#[derive(Debug, Clone)]
pub struct HeaderRelay {
    request:  RequestContext,
    response: ResponseContext,
}

impl HeaderRelay {
    pub fn new(request: &RequestContext, response: &ResponseContext) -> Self {
        Self {
            request:  request.clone(),
            response: response.clone(),
        }
    }

    /// Sitecore へ転送するヘッダー
    pub fn outbound_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for name in RELAYED_REQUEST_HEADERS {
            if let Some(value) = self.request.headers.get(&name) {
                headers.insert(name, value.clone());
            }
        }
        let forwarded_for = self
            .request
            .remote_addr
            .and_then(|addr| HeaderValue::from_str(&addr.to_string()).ok());
        if let Some(value) = forwarded_for {
            headers.insert(X_FORWARDED_FOR, value);
        }
        headers
    }

    /// Sitecore の `set-cookie` をレスポンスハンドルへ書き戻す
    pub fn relay_set_cookie(&self, remote_headers: &HeaderMap) {
        let values: Vec<HeaderValue> = remote_headers.get_all(SET_COOKIE).iter().cloned().collect();
        if !values.is_empty() {
            self.response.set_cookies(values);
        }
    }
}
