// crates/stark-core/src/typed_data.rs
//
// Structured message hashing (StarkNet typed data, revision 0).
//
//   type_hash(T)      = starknet_keccak(encode_type(T))
//   struct_hash(T, v) = hash_on_elements(type_hash(T), enc(v.f_1), .., enc(v.f_k))
//   message_hash      = hash_on_elements("StarkNet Message",
//                                        struct_hash(StarkNetDomain, domain),
//                                        account,
//                                        struct_hash(primaryType, message))
//
// Field encodings follow the member's type tag (see `FieldType`). Strings that
// are not numbers are encoded character by character: each code point is
// written in hex and the digits are concatenated behind a `0x` marker, then
// read as one integer mod p.

use std::collections::{BTreeMap, BTreeSet};

use ark_ff::Zero;
use num_bigint::BigUint;
use num_traits::Num;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;
use crate::field::{self, Felt};
use crate::params::CurveParameters;
use crate::pedersen::compute_hash_on_elements;
use crate::selector::starknet_keccak;

/// Name of the domain-separation type.
pub const DOMAIN_TYPE: &str = "StarkNetDomain";

/// First element of every message hash.
pub const MESSAGE_PREFIX: &str = "StarkNet Message";

/// One `(name, type)` entry of a struct declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMember {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
}

impl TypeMember {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        TypeMember {
            name: name.into(),
            type_tag: type_tag.into(),
        }
    }
}

/// Encoding rule selected by a member's type tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// `felt`: numbers pass through, other strings are short strings.
    Felt,
    /// `felt*`: array hash of felts.
    FeltArray,
    /// `string` / `shortstring`: always character-encoded.
    ShortString,
    /// A declared struct type.
    Struct(String),
    /// `Name*`: array hash of struct hashes.
    StructArray(String),
}

impl FieldType {
    pub fn parse(
        tag: &str,
        types: &BTreeMap<String, Vec<TypeMember>>,
    ) -> Result<Self, DomainError> {
        match tag {
            "felt" => Ok(FieldType::Felt),
            "felt*" => Ok(FieldType::FeltArray),
            "string" | "shortstring" => Ok(FieldType::ShortString),
            _ => match tag.strip_suffix('*') {
                Some(inner) if types.contains_key(inner) => {
                    Ok(FieldType::StructArray(inner.to_string()))
                }
                None if types.contains_key(tag) => Ok(FieldType::Struct(tag.to_string())),
                _ => Err(DomainError::UnknownType(tag.to_string())),
            },
        }
    }

    fn referenced_struct(&self) -> Option<&str> {
        match self {
            FieldType::Struct(name) | FieldType::StructArray(name) => Some(name),
            _ => None,
        }
    }
}

/// A typed-data document: type declarations, the primary type, the domain
/// record and the message value.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub types: BTreeMap<String, Vec<TypeMember>>,
    pub primary_type: String,
    pub domain: Value,
    pub message: Value,
}

impl TypedData {
    /// Build a document and check that every type tag resolves.
    pub fn new(
        types: BTreeMap<String, Vec<TypeMember>>,
        primary_type: impl Into<String>,
        domain: Value,
        message: Value,
    ) -> Result<Self, DomainError> {
        let typed = TypedData {
            types,
            primary_type: primary_type.into(),
            domain,
            message,
        };
        typed.check_types()?;
        Ok(typed)
    }

    pub fn from_json_str(text: &str) -> Result<Self, DomainError> {
        let typed: TypedData = serde_json::from_str(text)
            .map_err(|e| DomainError::InvalidTypedData(e.to_string()))?;
        typed.check_types()?;
        Ok(typed)
    }

    fn check_types(&self) -> Result<(), DomainError> {
        for name in [DOMAIN_TYPE, self.primary_type.as_str()] {
            if !self.types.contains_key(name) {
                return Err(DomainError::UnknownType(name.to_string()));
            }
        }
        for members in self.types.values() {
            for member in members {
                FieldType::parse(&member.type_tag, &self.types)?;
            }
        }
        Ok(())
    }

    fn members(&self, type_name: &str) -> Result<&[TypeMember], DomainError> {
        self.types
            .get(type_name)
            .map(Vec::as_slice)
            .ok_or_else(|| DomainError::UnknownType(type_name.to_string()))
    }

    /// Struct types reachable from `type_name`, excluding itself, sorted.
    fn dependencies(&self, type_name: &str) -> Result<BTreeSet<String>, DomainError> {
        let mut found = BTreeSet::new();
        let mut pending = vec![type_name.to_string()];
        while let Some(current) = pending.pop() {
            for member in self.members(&current)? {
                let field_type = FieldType::parse(&member.type_tag, &self.types)?;
                if let Some(dep) = field_type.referenced_struct() {
                    if dep != type_name && found.insert(dep.to_string()) {
                        pending.push(dep.to_string());
                    }
                }
            }
        }
        Ok(found)
    }

    /// `Name(a:felt,b:Other)Other(..)`, dependencies in name order.
    pub fn encode_type(&self, type_name: &str) -> Result<String, DomainError> {
        let mut encoded = self.encode_single_type(type_name)?;
        for dep in self.dependencies(type_name)? {
            encoded.push_str(&self.encode_single_type(&dep)?);
        }
        Ok(encoded)
    }

    fn encode_single_type(&self, type_name: &str) -> Result<String, DomainError> {
        let fields = self
            .members(type_name)?
            .iter()
            .map(|m| format!("{}:{}", m.name, m.type_tag))
            .collect::<Vec<_>>()
            .join(",");
        Ok(format!("{type_name}({fields})"))
    }

    pub fn type_hash(&self, type_name: &str) -> Result<Felt, DomainError> {
        Ok(starknet_keccak(self.encode_type(type_name)?.as_bytes()))
    }

    /// The element sequence hashed for one struct value: the type hash
    /// followed by each member's encoding in declaration order.
    pub fn encode_struct(
        &self,
        curve: &CurveParameters,
        type_name: &str,
        value: &Value,
    ) -> Result<Vec<Felt>, DomainError> {
        let object = value.as_object().ok_or_else(|| DomainError::TypeMismatch {
            field: type_name.to_string(),
            expected: format!("{type_name} object"),
        })?;

        let members = self.members(type_name)?;
        let mut elements = Vec::with_capacity(members.len() + 1);
        elements.push(self.type_hash(type_name)?);
        for member in members {
            let field_value = object.get(&member.name).ok_or_else(|| DomainError::MissingField {
                type_name: type_name.to_string(),
                field: member.name.clone(),
            })?;
            let field_type = FieldType::parse(&member.type_tag, &self.types)?;
            elements.push(self.encode_value(curve, &member.name, &field_type, field_value)?);
        }
        Ok(elements)
    }

    pub fn struct_hash(
        &self,
        curve: &CurveParameters,
        type_name: &str,
        value: &Value,
    ) -> Result<Felt, DomainError> {
        compute_hash_on_elements(curve, &self.encode_struct(curve, type_name, value)?)
    }

    fn encode_value(
        &self,
        curve: &CurveParameters,
        field: &str,
        field_type: &FieldType,
        value: &Value,
    ) -> Result<Felt, DomainError> {
        match field_type {
            FieldType::Felt => encode_felt_value(field, value),
            FieldType::ShortString => match value {
                Value::String(text) => short_string_to_felt(text),
                _ => Err(mismatch(field, "string")),
            },
            FieldType::FeltArray => {
                let items = value.as_array().ok_or_else(|| mismatch(field, "felt*"))?;
                let encoded = items
                    .iter()
                    .map(|item| encode_felt_value(field, item))
                    .collect::<Result<Vec<_>, _>>()?;
                compute_hash_on_elements(curve, &encoded)
            }
            FieldType::Struct(name) => self.struct_hash(curve, name, value),
            FieldType::StructArray(name) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch(field, &format!("{name}*")))?;
                let hashes = items
                    .iter()
                    .map(|item| self.struct_hash(curve, name, item))
                    .collect::<Result<Vec<_>, _>>()?;
                compute_hash_on_elements(curve, &hashes)
            }
        }
    }

    pub fn domain_hash(&self, curve: &CurveParameters) -> Result<Felt, DomainError> {
        self.struct_hash(curve, DOMAIN_TYPE, &self.domain)
    }

    /// The final element sequence: prefix, domain hash, account (when
    /// present) and the primary struct hash.
    pub fn message_elements(
        &self,
        curve: &CurveParameters,
        account: Option<&Felt>,
    ) -> Result<Vec<Felt>, DomainError> {
        let mut elements = vec![short_string_to_felt(MESSAGE_PREFIX)?, self.domain_hash(curve)?];
        elements.extend(account.copied());
        elements.push(self.struct_hash(curve, &self.primary_type, &self.message)?);
        Ok(elements)
    }

    pub fn message_hash(
        &self,
        curve: &CurveParameters,
        account: Option<&Felt>,
    ) -> Result<Felt, DomainError> {
        let hash = compute_hash_on_elements(curve, &self.message_elements(curve, account)?)?;
        log::debug!(
            "typed data {} hashed to {}",
            self.primary_type,
            field::to_hex(&hash)
        );
        Ok(hash)
    }
}

/// Character-by-character hex expansion behind a `0x` marker.
///
/// `""` gives `"0x"`, `"A"` gives `"0x41"`.
pub fn encode_ascii_hex(text: &str) -> String {
    let mut encoded = String::from("0x");
    for c in text.chars() {
        encoded.push_str(&format!("{:x}", u32::from(c)));
    }
    encoded
}

/// `encode_ascii_hex` read as an integer and reduced into the field.
pub fn short_string_to_felt(text: &str) -> Result<Felt, DomainError> {
    let encoded = encode_ascii_hex(text);
    let digits = &encoded[2..];
    if digits.is_empty() {
        return Ok(Felt::zero());
    }
    let value = BigUint::from_str_radix(digits, 16)
        .map_err(|_| DomainError::InvalidNumber(encoded.clone()))?;
    if text.chars().count() > 31 {
        log::warn!("short string of {} characters wraps modulo p", text.chars().count());
    }
    Ok(field::from_biguint_reduced(&value))
}

fn encode_felt_value(field: &str, value: &Value) -> Result<Felt, DomainError> {
    match value {
        Value::Number(number) => field::parse_felt(&number.to_string()),
        Value::String(text) if looks_numeric(text) => field::parse_felt(text),
        Value::String(text) => short_string_to_felt(text),
        _ => Err(mismatch(field, "felt")),
    }
}

/// Decimal digits, or anything claiming to be hex. A malformed `0x` value
/// is reported rather than silently treated as text.
fn looks_numeric(text: &str) -> bool {
    text.starts_with("0x")
        || text.starts_with("0X")
        || (!text.is_empty() && text.chars().all(|c| c.is_ascii_digit()))
}

fn mismatch(field: &str, expected: &str) -> DomainError {
    DomainError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}
