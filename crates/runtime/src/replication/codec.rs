//! bincode framing for replication messages.

use super::error::ReplicationError;
use super::messages::{Broadcast, Request};

pub fn encode_request(request: &Request) -> Result<Vec<u8>, ReplicationError> {
    Ok(bincode::serialize(request)?)
}

pub fn decode_request(bytes: &[u8]) -> Result<Request, ReplicationError> {
    Ok(bincode::deserialize(bytes)?)
}

pub fn encode_broadcast(broadcast: &Broadcast) -> Result<Vec<u8>, ReplicationError> {
    Ok(bincode::serialize(broadcast)?)
}

pub fn decode_broadcast(bytes: &[u8]) -> Result<Broadcast, ReplicationError> {
    Ok(bincode::deserialize(bytes)?)
}
