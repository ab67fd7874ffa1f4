//! JSON payloads exchanged with the REST backend.
//!
//! The backend speaks PascalCase keys and pre-formats sizes for display;
//! these types accept that shape and convert it into core types.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use cloudshelf_core::{
    Container, FileEntry, FolderEntry, GatewayError, GatewayResult, Instance, InstanceState,
    Listing, Vpc, parse_size,
};

/// Placeholder the backend uses for missing values.
const NOT_AVAILABLE: &str = "N/A";

/// Backend liveness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// A size that is either raw bytes or a formatted string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SizeField {
    Bytes(u64),
    Text(String),
}

impl SizeField {
    fn bytes(&self) -> Option<u64> {
        match self {
            Self::Bytes(n) => Some(*n),
            Self::Text(s) => parse_size(s),
        }
    }
}

impl Default for SizeField {
    fn default() -> Self {
        Self::Bytes(0)
    }
}

/// A count that may be replaced by `"N/A"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CountField {
    Count(u64),
    Text(String),
}

impl CountField {
    fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != NOT_AVAILABLE)
}

pub(crate) fn parse_timestamp(raw: &str) -> GatewayResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| GatewayError::decode(format!("bad timestamp {raw:?}: {e}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireBucket {
    name: String,
    creation_date: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    size: SizeField,
    object_count: Option<CountField>,
}

impl TryFrom<WireBucket> for Container {
    type Error = GatewayError;

    fn try_from(wire: WireBucket) -> GatewayResult<Self> {
        let created = parse_timestamp(&wire.creation_date)?;
        let object_count = wire.object_count.as_ref().and_then(CountField::count);
        Ok(Container::new(wire.name, wire.region, created)
            .with_usage(wire.size.bytes().unwrap_or(0), object_count))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireFolder {
    full_path: String,
    file_count: Option<CountField>,
    size: Option<SizeField>,
}

impl From<WireFolder> for FolderEntry {
    fn from(wire: WireFolder) -> Self {
        let file_count = wire.file_count.as_ref().and_then(CountField::count);
        // Folders with nothing countable report a placeholder size.
        let size = wire
            .size
            .as_ref()
            .and_then(SizeField::bytes)
            .filter(|_| file_count.is_some());
        FolderEntry::new(wire.full_path).with_usage(file_count, size)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireFile {
    full_path: String,
    size: SizeField,
    last_modified: String,
}

impl TryFrom<WireFile> for FileEntry {
    type Error = GatewayError;

    fn try_from(wire: WireFile) -> GatewayResult<Self> {
        let size = wire
            .size
            .bytes()
            .ok_or_else(|| GatewayError::decode(format!("bad size for {}", wire.full_path)))?;
        let modified = parse_timestamp(&wire.last_modified)?;
        Ok(FileEntry::new(wire.full_path, size, modified))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireListing {
    #[serde(default)]
    folders: Vec<WireFolder>,
    #[serde(default)]
    files: Vec<WireFile>,
    #[serde(default)]
    current_prefix: String,
}

impl TryFrom<WireListing> for Listing {
    type Error = GatewayError;

    fn try_from(wire: WireListing) -> GatewayResult<Self> {
        Ok(Listing {
            folders: wire.folders.into_iter().map(FolderEntry::from).collect(),
            files: wire
                .files
                .into_iter()
                .map(FileEntry::try_from)
                .collect::<GatewayResult<_>>()?,
            current_prefix: wire.current_prefix,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireInstance {
    instance_id: String,
    #[serde(default)]
    name: String,
    state: String,
    #[serde(default)]
    instance_type: String,
    #[serde(default)]
    platform: Option<String>,
    public_ip_address: Option<String>,
    private_ip_address: Option<String>,
    launch_time: Option<String>,
    vpc_id: Option<String>,
    subnet_id: Option<String>,
}

impl TryFrom<WireInstance> for Instance {
    type Error = GatewayError;

    fn try_from(wire: WireInstance) -> GatewayResult<Self> {
        let state: InstanceState = wire.state.parse().map_err(|_| {
            GatewayError::decode(format!(
                "unknown state {:?} for instance {}",
                wire.state, wire.instance_id
            ))
        })?;
        let launched = optional(wire.launch_time)
            .map(|raw| parse_timestamp(&raw))
            .transpose()?;

        let mut instance = Instance::new(wire.instance_id, wire.name, state);
        instance.instance_type = wire.instance_type;
        if let Some(platform) = optional(wire.platform) {
            instance.platform = platform;
        }
        instance.public_ip = optional(wire.public_ip_address);
        instance.private_ip = optional(wire.private_ip_address);
        instance.launched = launched;
        instance.vpc_id = optional(wire.vpc_id);
        instance.subnet_id = optional(wire.subnet_id);
        Ok(instance)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireVpc {
    vpc_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    cidr_block: String,
    #[serde(default)]
    is_default: bool,
    #[serde(default)]
    tenancy: String,
}

impl From<WireVpc> for Vpc {
    fn from(wire: WireVpc) -> Self {
        Vpc {
            id: wire.vpc_id,
            name: wire.name,
            state: wire.state,
            cidr_block: wire.cidr_block,
            is_default: wire.is_default,
            tenancy: wire.tenancy,
        }
    }
}

/// Body of a rejected request.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Body of an accepted mutation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bucket_with_formatted_size() {
        let json = r#"{
            "Name": "logs",
            "CreationDate": "2023-05-01T10:00:00+00:00",
            "Region": "eu-west-1",
            "Size": "1.5 KB",
            "ObjectCount": 3
        }"#;
        let wire: WireBucket = serde_json::from_str(json).unwrap();
        let bucket = Container::try_from(wire).unwrap();

        assert_eq!(bucket.name, "logs");
        assert_eq!(bucket.size, 1536);
        assert_eq!(bucket.object_count, Some(3));
    }

    #[test]
    fn test_decode_bucket_not_accessible() {
        let json = r#"{
            "Name": "locked",
            "CreationDate": "2023-05-01T10:00:00.250000+00:00",
            "Region": "Unknown",
            "Size": "Empty",
            "ObjectCount": "N/A"
        }"#;
        let wire: WireBucket = serde_json::from_str(json).unwrap();
        let bucket = Container::try_from(wire).unwrap();

        assert_eq!(bucket.size, 0);
        assert_eq!(bucket.object_count, None);
    }

    #[test]
    fn test_decode_listing() {
        let json = r#"{
            "folders": [
                {"Name": "2024", "FullPath": "2024/", "Type": "folder", "FileCount": 4, "Size": "2.0 MB"},
                {"Name": "private", "FullPath": "private/", "Type": "folder", "FileCount": "N/A", "Size": "—"}
            ],
            "files": [
                {"Name": "readme.txt", "FullPath": "readme.txt", "Size": "120 B",
                 "LastModified": "2024-02-03T04:05:06+00:00", "Type": "file"}
            ],
            "currentPrefix": ""
        }"#;
        let wire: WireListing = serde_json::from_str(json).unwrap();
        let listing = Listing::try_from(wire).unwrap();

        assert_eq!(listing.folders[0].name, "2024");
        assert_eq!(listing.folders[0].file_count, Some(4));
        assert_eq!(listing.folders[0].size, Some(2 * 1024 * 1024));
        assert_eq!(listing.folders[1].file_count, None);
        assert_eq!(listing.folders[1].size, None);
        assert_eq!(listing.files[0].size, 120);
        assert_eq!(listing.current_prefix, "");
    }

    #[test]
    fn test_decode_instance_placeholders() {
        let json = r#"{
            "InstanceId": "i-0abc",
            "Name": "No Name",
            "State": "stopped",
            "InstanceType": "t3.micro",
            "PublicIpAddress": "N/A",
            "PrivateIpAddress": "10.0.1.4",
            "LaunchTime": "N/A",
            "Platform": "Linux",
            "VpcId": "vpc-1",
            "SubnetId": "N/A"
        }"#;
        let wire: WireInstance = serde_json::from_str(json).unwrap();
        let instance = Instance::try_from(wire).unwrap();

        assert_eq!(instance.state, InstanceState::Stopped);
        assert_eq!(instance.public_ip, None);
        assert_eq!(instance.private_ip.as_deref(), Some("10.0.1.4"));
        assert_eq!(instance.launched, None);
        assert_eq!(instance.subnet_id, None);
    }

    #[test]
    fn test_decode_instance_unknown_state() {
        let json = r#"{"InstanceId": "i-1", "State": "hibernating"}"#;
        let wire: WireInstance = serde_json::from_str(json).unwrap();
        let err = Instance::try_from(wire).unwrap_err();
        assert!(matches!(err, GatewayError::Decode { .. }));
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let ts = parse_timestamp("2024-01-01T00:00:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
