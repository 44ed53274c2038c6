pub mod client;
pub mod path;
pub mod streaming;
pub mod types;
pub mod xml;

pub use client::WebDavClient;
pub use path::{decode_path, encode_path};
pub use streaming::{parse_multistatus_bytes, parse_multistatus_stream};
pub use types::{DavEntry, DavListing, Depth};
pub use xml::{LISTING_PROPS, build_propfind_body, escape_xml};
