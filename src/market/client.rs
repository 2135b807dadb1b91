//! Remote operations of the market API.
//!
//! One method per capability. Every operation runs an explicit
//! ensure-authenticated guard before its first request: a session
//! without a token logs in transparently.

use std::collections::BTreeMap;
use std::io::Read;

use reqwest::blocking::Response;
use reqwest::header::{ACCEPT_ENCODING, COOKIE, USER_AGENT};
use tracing::debug;
use url::form_urlencoded;

use super::codec::{self, ResponsePayload};
use super::proto::{
    BrowseResponse, BulkDetailsResponse, DetailsResponse, ListResponse, ReviewResponse,
    SearchResponse,
};
use super::session::{RequestBody, RequestError, Session};
use crate::types::{PackageName, RemoteApk};

const DOWNLOADER_USER_AGENT: &str =
    "AndroidDownloadManager/4.1.1 (Linux; U; Android 4.1.1; Nexus S Build/JRO03E)";

/// Default review sort order (helpfulness).
pub const REVIEW_SORT_DEFAULT: u32 = 2;

/// A live artifact byte stream, not buffered in memory.
#[derive(Debug)]
pub struct DownloadStream {
    response: Response,
}

impl DownloadStream {
    /// The size the delivery server declared, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }
}

impl Read for DownloadStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.response.read(buf)
    }
}

/// Client over one authenticated session.
#[derive(Debug)]
pub struct MarketClient {
    session: Session,
}

impl MarketClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The session token, for persistence by the caller.
    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    fn ensure_authenticated(&mut self) -> Result<(), RequestError> {
        if !self.session.has_token() {
            self.session.login()?;
        }
        Ok(())
    }

    fn payload(
        &mut self,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<ResponsePayload, RequestError> {
        let envelope = self.session.authenticated_request(path, body)?;
        Ok(ResponsePayload::classify(envelope)?)
    }

    /// Search for apps matching `query`.
    pub fn search(
        &mut self,
        query: &str,
        results: Option<u32>,
        offset: Option<u32>,
    ) -> Result<SearchResponse, RequestError> {
        self.ensure_authenticated()?;
        let mut path = format!("search?c=3&q={}", encode(query));
        if let Some(n) = results {
            path.push_str(&format!("&n={n}"));
        }
        if let Some(o) = offset {
            path.push_str(&format!("&o={o}"));
        }
        match self.payload(&path, None)? {
            ResponsePayload::Search(r) => Ok(r),
            _ => Err(RequestError::MissingField("searchResponse")),
        }
    }

    /// Full details for one package.
    pub fn details(&mut self, package: &str) -> Result<DetailsResponse, RequestError> {
        self.ensure_authenticated()?;
        let path = format!("details?doc={}", encode(package));
        match self.payload(&path, None)? {
            ResponsePayload::Details(r) => Ok(r),
            _ => Err(RequestError::MissingField("detailsResponse")),
        }
    }

    /// Details for a batch of packages in one request.
    ///
    /// Entries come back in server order, not request order; correlate
    /// by docid.
    pub fn bulk_details(
        &mut self,
        packages: &[PackageName],
    ) -> Result<BulkDetailsResponse, RequestError> {
        self.ensure_authenticated()?;
        let body = codec::encode_bulk_details(packages);
        match self.payload("bulkDetails", Some(RequestBody::Proto(body)))? {
            ResponsePayload::BulkDetails(r) => Ok(r),
            _ => Err(RequestError::MissingField("bulkDetailsResponse")),
        }
    }

    /// Browse categories; `cat` and `ctr` filter by (sub)category id.
    pub fn browse(
        &mut self,
        cat: Option<&str>,
        ctr: Option<&str>,
    ) -> Result<BrowseResponse, RequestError> {
        self.ensure_authenticated()?;
        let mut path = "browse?c=3".to_string();
        if let Some(cat) = cat {
            path.push_str(&format!("&cat={}", encode(cat)));
        }
        if let Some(ctr) = ctr {
            path.push_str(&format!("&ctr={}", encode(ctr)));
        }
        match self.payload(&path, None)? {
            ResponsePayload::Browse(r) => Ok(r),
            _ => Err(RequestError::MissingField("browseResponse")),
        }
    }

    /// List apps within a category. Without `ctr` the server lists the
    /// valid subcategories instead.
    pub fn list(
        &mut self,
        cat: &str,
        ctr: Option<&str>,
        results: Option<u32>,
        offset: Option<u32>,
    ) -> Result<ListResponse, RequestError> {
        self.ensure_authenticated()?;
        let mut path = format!("list?c=3&cat={}", encode(cat));
        if let Some(ctr) = ctr {
            path.push_str(&format!("&ctr={}", encode(ctr)));
        }
        if let Some(n) = results {
            path.push_str(&format!("&n={n}"));
        }
        if let Some(o) = offset {
            path.push_str(&format!("&o={o}"));
        }
        match self.payload(&path, None)? {
            ResponsePayload::List(r) => Ok(r),
            _ => Err(RequestError::MissingField("listResponse")),
        }
    }

    /// Reviews for one package.
    pub fn reviews(
        &mut self,
        package: &str,
        filter_by_device: bool,
        sort: u32,
        results: Option<u32>,
        offset: Option<u32>,
    ) -> Result<ReviewResponse, RequestError> {
        self.ensure_authenticated()?;
        let mut path = format!("rev?doc={}&sort={sort}", encode(package));
        if let Some(n) = results {
            path.push_str(&format!("&n={n}"));
        }
        if let Some(o) = offset {
            path.push_str(&format!("&o={o}"));
        }
        if filter_by_device {
            path.push_str("&dfil=1");
        }
        match self.payload(&path, None)? {
            ResponsePayload::Review(r) => Ok(r),
            _ => Err(RequestError::MissingField("reviewResponse")),
        }
    }

    /// Purchase a package and open its artifact stream.
    ///
    /// Issues the purchase POST, extracts the signed URL and the single
    /// download-authorization cookie from the nested purchase status,
    /// then GETs the artifact. Any absent link in that chain is fatal
    /// for the operation; no partial result is returned.
    pub fn download(
        &mut self,
        package: &str,
        version_code: i32,
        offer_type: i32,
    ) -> Result<DownloadStream, RequestError> {
        self.ensure_authenticated()?;
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("ot", &offer_type.to_string())
            .append_pair("doc", package)
            .append_pair("vc", &version_code.to_string())
            .finish();
        let buy = match self.payload("purchase", Some(RequestBody::Form(body)))? {
            ResponsePayload::Buy(r) => r,
            _ => return Err(RequestError::MissingField("buyResponse")),
        };
        let delivery = buy
            .purchase_status_response
            .ok_or(RequestError::MissingField("purchaseStatusResponse"))?
            .app_delivery_data
            .ok_or(RequestError::MissingField("appDeliveryData"))?;
        if delivery.download_url.is_empty() {
            return Err(RequestError::MissingField("downloadUrl"));
        }
        let cookie = delivery
            .download_auth_cookie
            .first()
            .ok_or(RequestError::MissingField("downloadAuthCookie"))?;

        debug!(package, version_code, "purchase granted, opening artifact stream");
        let response = self
            .session
            .http()
            .get(&delivery.download_url)
            .header(USER_AGENT, DOWNLOADER_USER_AGENT)
            .header(ACCEPT_ENCODING, "")
            .header(COOKIE, format!("{}={}", cookie.name, cookie.value))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status(status));
        }
        Ok(DownloadStream { response })
    }

    /// Remote version codes for the configured set, keyed by name.
    ///
    /// Packages the server omitted are simply absent from the map.
    pub fn bulk_version_codes(
        &mut self,
        packages: &[PackageName],
    ) -> Result<BTreeMap<PackageName, i32>, RequestError> {
        let response = self.bulk_details(packages)?;
        let mut codes = BTreeMap::new();
        for entry in response.entry {
            let Some(doc) = entry.doc else { continue };
            let Some(app) = doc.details.as_ref().and_then(|d| d.app_details.as_ref()) else {
                continue;
            };
            let name = if !doc.docid.is_empty() {
                doc.docid.as_str()
            } else if !app.package_name.is_empty() {
                app.package_name.as_str()
            } else {
                continue;
            };
            codes.insert(PackageName::new(name), app.version_code);
        }
        Ok(codes)
    }

    /// Full metadata for one package: version, offer classification and
    /// size (bulk details does not carry size).
    pub fn remote_apk(&mut self, name: &PackageName) -> Result<RemoteApk, RequestError> {
        let details = self.details(name.as_str())?;
        let doc = details.doc_v2.ok_or(RequestError::MissingField("docV2"))?;
        let offer = doc
            .offer
            .first()
            .ok_or(RequestError::MissingField("offer"))?
            .offer_type;
        let app = doc
            .details
            .and_then(|d| d.app_details)
            .ok_or(RequestError::MissingField("appDetails"))?;
        Ok(RemoteApk {
            name: name.clone(),
            code: app.version_code,
            version: app.version_string,
            offer,
            size: app.installation_size.max(0) as u64,
        })
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
