//! Pure (de)serialization between raw bodies and typed protocol messages.
//!
//! The codec performs no I/O and never touches session state; prefetch
//! registration is an explicit session step after decode.

use prost::Message;
use thiserror::Error;

use super::proto::{
    BrowseResponse, BulkDetailsRequest, BulkDetailsResponse, BuyResponse, DetailsResponse,
    ListResponse, Payload, ResponseWrapper, ReviewResponse, SearchResponse,
};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed response body: {0}")]
    Malformed(#[from] prost::DecodeError),

    #[error("response carried no recognized payload")]
    EmptyPayload,
}

/// Decode a raw response body into the protocol envelope.
pub fn decode_envelope(body: &[u8]) -> Result<ResponseWrapper, DecodeError> {
    Ok(ResponseWrapper::decode(body)?)
}

/// The payload variants a response can carry; exactly one per response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Search(SearchResponse),
    Details(DetailsResponse),
    BulkDetails(BulkDetailsResponse),
    Browse(BrowseResponse),
    List(ListResponse),
    Review(ReviewResponse),
    Buy(BuyResponse),
}

impl ResponsePayload {
    /// Classify a decoded envelope into its single populated variant.
    /// An empty or unrecognized payload is a decode error, not a null.
    pub fn classify(envelope: ResponseWrapper) -> Result<Self, DecodeError> {
        let payload = envelope.payload.ok_or(DecodeError::EmptyPayload)?;
        Self::from_payload(payload)
    }

    fn from_payload(payload: Payload) -> Result<Self, DecodeError> {
        if let Some(r) = payload.search_response {
            Ok(Self::Search(r))
        } else if let Some(r) = payload.details_response {
            Ok(Self::Details(r))
        } else if let Some(r) = payload.bulk_details_response {
            Ok(Self::BulkDetails(r))
        } else if let Some(r) = payload.browse_response {
            Ok(Self::Browse(r))
        } else if let Some(r) = payload.list_response {
            Ok(Self::List(r))
        } else if let Some(r) = payload.review_response {
            Ok(Self::Review(r))
        } else if let Some(r) = payload.buy_response {
            Ok(Self::Buy(r))
        } else {
            Err(DecodeError::EmptyPayload)
        }
    }
}

/// Serialize the batch details request body.
///
/// Never fails for well-formed input; every field is a plain string list.
pub fn encode_bulk_details<S: AsRef<str>>(names: &[S]) -> Vec<u8> {
    let request = BulkDetailsRequest {
        docid: names.iter().map(|n| n.as_ref().to_string()).collect(),
        include_child_docs: false,
    };
    request.encode_to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::proto::{AppDetails, DocV2, DocumentDetails};

    fn details_wrapper(package: &str, code: i32) -> ResponseWrapper {
        ResponseWrapper {
            payload: Some(Payload {
                details_response: Some(DetailsResponse {
                    doc_v2: Some(DocV2 {
                        docid: package.to_string(),
                        details: Some(DocumentDetails {
                            app_details: Some(AppDetails {
                                version_code: code,
                                version_string: "1.0".to_string(),
                                package_name: package.to_string(),
                                ..Default::default()
                            }),
                        }),
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            }),
            pre_fetch: Vec::new(),
        }
    }

    #[test]
    fn envelope_round_trips() {
        let wrapper = details_wrapper("com.example.app", 7);
        let bytes = wrapper.encode_to_vec();

        let decoded = decode_envelope(&bytes).unwrap();
        match ResponsePayload::classify(decoded).unwrap() {
            ResponsePayload::Details(details) => {
                let doc = details.doc_v2.unwrap();
                assert_eq!(doc.docid, "com.example.app");
                let app = doc.details.unwrap().app_details.unwrap();
                assert_eq!(app.version_code, 7);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        // Length-delimited field 1 claiming 150 bytes with none present.
        let err = decode_envelope(&[0x0a, 0x96, 0x01]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn empty_payload_is_a_decode_error() {
        let wrapper = ResponseWrapper {
            payload: Some(Payload::default()),
            pre_fetch: Vec::new(),
        };
        let err = ResponsePayload::classify(wrapper).unwrap_err();
        assert!(matches!(err, DecodeError::EmptyPayload));

        let wrapper = ResponseWrapper::default();
        let err = ResponsePayload::classify(wrapper).unwrap_err();
        assert!(matches!(err, DecodeError::EmptyPayload));
    }

    #[test]
    fn bulk_request_carries_every_name() {
        let bytes = encode_bulk_details(&["com.a", "com.b"]);
        let decoded = BulkDetailsRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.docid, vec!["com.a", "com.b"]);
        assert!(!decoded.include_child_docs);
    }
}
