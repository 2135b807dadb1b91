//! Wire messages for the market protocol.
//!
//! Field numbers are fixed by the server's protobuf schema; only the
//! subset of messages and fields this client reads is declared here.

/// Outer envelope of every API response.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ResponseWrapper {
    #[prost(message, optional, tag = "1")]
    pub payload: Option<Payload>,
    /// Server-volunteered responses for paths not yet requested.
    #[prost(message, repeated, tag = "3")]
    pub pre_fetch: Vec<PreFetch>,
}

/// Response content; the server populates exactly one field.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Payload {
    #[prost(message, optional, tag = "1")]
    pub list_response: Option<ListResponse>,
    #[prost(message, optional, tag = "2")]
    pub details_response: Option<DetailsResponse>,
    #[prost(message, optional, tag = "3")]
    pub review_response: Option<ReviewResponse>,
    #[prost(message, optional, tag = "4")]
    pub buy_response: Option<BuyResponse>,
    #[prost(message, optional, tag = "5")]
    pub search_response: Option<SearchResponse>,
    #[prost(message, optional, tag = "7")]
    pub browse_response: Option<BrowseResponse>,
    #[prost(message, optional, tag = "19")]
    pub bulk_details_response: Option<BulkDetailsResponse>,
}

/// One opportunistically cached response: the raw body the server would
/// return for a request to `url`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PreFetch {
    #[prost(string, tag = "1")]
    pub url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub response: Vec<u8>,
}

/// Batch request body for the `bulkDetails` operation.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BulkDetailsRequest {
    #[prost(string, repeated, tag = "1")]
    pub docid: Vec<String>,
    #[prost(bool, tag = "2")]
    pub include_child_docs: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BulkDetailsResponse {
    /// One entry per resolved package, in server order. Correlate by
    /// docid, not by request position.
    #[prost(message, repeated, tag = "1")]
    pub entry: Vec<BulkDetailsEntry>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BulkDetailsEntry {
    #[prost(message, optional, tag = "1")]
    pub doc: Option<DocV2>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DetailsResponse {
    #[prost(message, optional, tag = "4")]
    pub doc_v2: Option<DocV2>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SearchResponse {
    #[prost(string, tag = "1")]
    pub original_query: String,
    #[prost(string, tag = "2")]
    pub suggested_query: String,
    #[prost(message, repeated, tag = "5")]
    pub doc: Vec<DocV2>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListResponse {
    #[prost(message, repeated, tag = "2")]
    pub doc: Vec<DocV2>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BrowseResponse {
    #[prost(string, tag = "1")]
    pub contents_url: String,
    #[prost(message, repeated, tag = "3")]
    pub category: Vec<BrowseLink>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BrowseLink {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub data_url: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReviewResponse {
    #[prost(message, optional, tag = "1")]
    pub get_response: Option<GetReviewsResponse>,
    #[prost(string, tag = "2")]
    pub next_page_url: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetReviewsResponse {
    #[prost(message, repeated, tag = "1")]
    pub review: Vec<Review>,
    #[prost(int64, tag = "2")]
    pub matching_count: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Review {
    #[prost(string, tag = "1")]
    pub author_name: String,
    #[prost(string, tag = "4")]
    pub document_version: String,
    #[prost(int64, tag = "5")]
    pub timestamp_msec: i64,
    #[prost(int32, tag = "6")]
    pub star_rating: i32,
    #[prost(string, tag = "7")]
    pub title: String,
    #[prost(string, tag = "8")]
    pub comment: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BuyResponse {
    #[prost(message, optional, tag = "39")]
    pub purchase_status_response: Option<PurchaseStatusResponse>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PurchaseStatusResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub status_msg: String,
    #[prost(message, optional, tag = "8")]
    pub app_delivery_data: Option<AndroidAppDeliveryData>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AndroidAppDeliveryData {
    #[prost(int64, tag = "1")]
    pub download_size: i64,
    #[prost(string, tag = "2")]
    pub signature: String,
    /// Signed, time-limited artifact URL.
    #[prost(string, tag = "3")]
    pub download_url: String,
    #[prost(message, repeated, tag = "5")]
    pub download_auth_cookie: Vec<HttpCookie>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HttpCookie {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DocV2 {
    /// Package name for app documents.
    #[prost(string, tag = "1")]
    pub docid: String,
    #[prost(string, tag = "2")]
    pub backend_docid: String,
    #[prost(int32, tag = "3")]
    pub doc_type: i32,
    #[prost(string, tag = "5")]
    pub title: String,
    #[prost(string, tag = "6")]
    pub creator: String,
    #[prost(message, repeated, tag = "8")]
    pub offer: Vec<Offer>,
    #[prost(message, optional, tag = "13")]
    pub details: Option<DocumentDetails>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Offer {
    #[prost(int64, tag = "1")]
    pub micros: i64,
    #[prost(string, tag = "2")]
    pub currency_code: String,
    #[prost(string, tag = "3")]
    pub formatted_amount: String,
    #[prost(int32, tag = "8")]
    pub offer_type: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DocumentDetails {
    #[prost(message, optional, tag = "1")]
    pub app_details: Option<AppDetails>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AppDetails {
    #[prost(string, tag = "1")]
    pub developer_name: String,
    #[prost(int32, tag = "3")]
    pub version_code: i32,
    #[prost(string, tag = "4")]
    pub version_string: String,
    #[prost(int64, tag = "9")]
    pub installation_size: i64,
    #[prost(string, tag = "14")]
    pub package_name: String,
}
