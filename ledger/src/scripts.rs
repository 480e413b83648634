//! Native (multisig) scripts and opaque Plutus script bytes.

use crate::{AddrKeyhash, Fragment, LedgerError, Reader, Result, Writer};

/// `native_script = [0, addr_keyhash] / [1, [* native_script]] /
/// [2, [* native_script]] / [3, uint, [* native_script]] / [4, uint] /
/// [5, uint]`
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum NativeScript {
    ScriptPubkey(AddrKeyhash),
    ScriptAll(Vec<NativeScript>),
    ScriptAny(Vec<NativeScript>),
    ScriptNOfK(u32, Vec<NativeScript>),
    InvalidBefore(u64),
    InvalidHereafter(u64),
}

impl Fragment for NativeScript {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_array()?;
        let variant = reader.read_uint()?;
        let result = match variant {
            0 => Self::ScriptPubkey(AddrKeyhash::from_cbor(reader)?),
            1 => Self::ScriptAll(decode_script_list(reader)?),
            2 => Self::ScriptAny(decode_script_list(reader)?),
            3 => {
                let required = reader.read_uint()? as u32;
                Self::ScriptNOfK(required, decode_script_list(reader)?)
            }
            4 => Self::InvalidBefore(reader.read_uint()?),
            5 => Self::InvalidHereafter(reader.read_uint()?),
            other => return Err(LedgerError::InvalidNativeScriptType(other)),
        };
        let _ = len;
        cardano_cbor::validate_end_array("NativeScript", reader)?;
        Ok(result)
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::ScriptPubkey(hash) => {
                writer.write_start_array(2);
                writer.write_uint(0);
                hash.to_cbor(writer)?;
            }
            Self::ScriptAll(scripts) => {
                writer.write_start_array(2);
                writer.write_uint(1);
                encode_script_list(writer, scripts)?;
            }
            Self::ScriptAny(scripts) => {
                writer.write_start_array(2);
                writer.write_uint(2);
                encode_script_list(writer, scripts)?;
            }
            Self::ScriptNOfK(required, scripts) => {
                writer.write_start_array(3);
                writer.write_uint(3);
                writer.write_uint(*required as u64);
                encode_script_list(writer, scripts)?;
            }
            Self::InvalidBefore(slot) => {
                writer.write_start_array(2);
                writer.write_uint(4);
                writer.write_uint(*slot);
            }
            Self::InvalidHereafter(slot) => {
                writer.write_start_array(2);
                writer.write_uint(5);
                writer.write_uint(*slot);
            }
        }
        writer.write_end_array();
        Ok(())
    }
}

fn decode_script_list(reader: &mut Reader) -> Result<Vec<NativeScript>> {
    let len = reader.read_start_array()?;
    let mut scripts = Vec::new();
    if len >= 0 {
        for _ in 0..len {
            scripts.push(NativeScript::from_cbor(reader)?);
        }
    } else {
        while reader.peek_state()? != cardano_cbor::PeekState::EndArray {
            scripts.push(NativeScript::from_cbor(reader)?);
        }
    }
    reader.read_end_array()?;
    Ok(scripts)
}

fn encode_script_list(writer: &mut Writer, scripts: &[NativeScript]) -> Result<()> {
    writer.write_start_array(scripts.len() as u64);
    for script in scripts {
        script.to_cbor(writer)?;
    }
    writer.write_end_array();
    Ok(())
}

/// `{ "type": "sig" | "all" | "any" | "atLeast" | "before" | "after",
///    "keyHash"?: string, "scripts"?: [...], "required"?: uint, "slot"?: uint }`
///
/// The wallet-tooling JSON surface used to build native scripts by hand,
/// behind the `json` feature. Unlike the CBOR binding, failures here are
/// reported as [`LedgerError::InvalidJson`] rather than wire-decoding
/// errors, since there is no reader offset to blame.
#[cfg(feature = "json")]
pub mod json {
    use super::NativeScript;
    use crate::{LedgerError, Result};
    use serde_json::Value;

    pub fn native_script_from_json(value: &Value) -> Result<NativeScript> {
        let obj = value
            .as_object()
            .ok_or_else(|| LedgerError::InvalidJson("expected a JSON object".into()))?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::InvalidJson("missing \"type\" field".into()))?;

        match kind {
            "sig" => {
                let key_hash = obj
                    .get("keyHash")
                    .and_then(Value::as_str)
                    .ok_or_else(|| LedgerError::InvalidJson("\"sig\" requires keyHash".into()))?;
                let hash = key_hash
                    .parse()
                    .map_err(|e| LedgerError::InvalidJson(format!("invalid keyHash: {e}")))?;
                Ok(NativeScript::ScriptPubkey(hash))
            }
            "all" => Ok(NativeScript::ScriptAll(nested_scripts(obj)?)),
            "any" => Ok(NativeScript::ScriptAny(nested_scripts(obj)?)),
            "atLeast" => {
                let required = obj
                    .get("required")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| LedgerError::InvalidJson("\"atLeast\" requires required".into()))?
                    as u32;
                Ok(NativeScript::ScriptNOfK(required, nested_scripts(obj)?))
            }
            "before" => Ok(NativeScript::InvalidHereafter(required_slot(obj)?)),
            "after" => Ok(NativeScript::InvalidBefore(required_slot(obj)?)),
            other => Err(LedgerError::InvalidJson(format!(
                "unknown native script type \"{other}\""
            ))),
        }
    }

    fn required_slot(obj: &serde_json::Map<String, Value>) -> Result<u64> {
        obj.get("slot")
            .and_then(Value::as_u64)
            .ok_or_else(|| LedgerError::InvalidJson("missing \"slot\" field".into()))
    }

    fn nested_scripts(obj: &serde_json::Map<String, Value>) -> Result<Vec<NativeScript>> {
        obj.get("scripts")
            .and_then(Value::as_array)
            .ok_or_else(|| LedgerError::InvalidJson("missing \"scripts\" field".into()))?
            .iter()
            .map(native_script_from_json)
            .collect()
    }
}

/// `plutus_script = bytes`, tagged at the type level by its language
/// version so a `PlutusScript<1>` can't be mistaken for a `PlutusScript<2>`
/// at compile time even though both round-trip as opaque byte strings.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PlutusScript<const VERSION: u8>(pub Vec<u8>);

impl<const VERSION: u8> PlutusScript<VERSION> {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<const VERSION: u8> Fragment for PlutusScript<VERSION> {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        Ok(Self(reader.read_bytestring()?))
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_bytestring(&self.0);
        Ok(())
    }
}

pub type PlutusV1Script = PlutusScript<1>;
pub type PlutusV2Script = PlutusScript<2>;
pub type PlutusV3Script = PlutusScript<3>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_all_round_trips() {
        let original = NativeScript::ScriptAll(vec![
            NativeScript::ScriptPubkey(AddrKeyhash::new([1u8; 28])),
            NativeScript::InvalidBefore(100),
        ]);
        let bytes = original.encode_fragment().unwrap();
        let decoded = NativeScript::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn unknown_discriminant_is_rejected() {
        let bytes = NativeScript::InvalidBefore(1).encode_fragment().unwrap();
        let mut tampered = bytes;
        tampered[1] = 9;
        let err = NativeScript::decode_fragment(&tampered).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidNativeScriptType(9)));
    }

    #[test]
    fn plutus_v2_script_round_trips() {
        let original = PlutusV2Script(vec![0xde, 0xad, 0xbe, 0xef]);
        let bytes = original.encode_fragment().unwrap();
        let decoded = PlutusV2Script::decode_fragment(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[cfg(feature = "json")]
    #[test]
    fn sig_script_parses_from_json() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{ "type": "sig", "keyHash": "1111111111111111111111111111111111111111111111111111" }"#,
        )
        .unwrap();
        let err = json::native_script_from_json(&value).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidJson(_)));
    }

    #[cfg(feature = "json")]
    #[test]
    fn sig_script_happy_path_from_json() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{ "type": "sig", "keyHash": "111111111111111111111111111111111111111111111111111111ab" }"#,
        )
        .unwrap();
        let script = json::native_script_from_json(&value).unwrap();
        let mut expected = [0x11u8; 28];
        expected[27] = 0xab;
        assert_eq!(script, NativeScript::ScriptPubkey(AddrKeyhash::new(expected)));
    }

    #[cfg(feature = "json")]
    #[test]
    fn all_script_happy_path_from_json() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{ "type": "all", "scripts": [
                { "type": "sig", "keyHash": "111111111111111111111111111111111111111111111111111111ab" },
                { "type": "before", "slot": 100 }
            ] }"#,
        )
        .unwrap();
        let script = json::native_script_from_json(&value).unwrap();
        let mut key_hash = [0x11u8; 28];
        key_hash[27] = 0xab;
        assert_eq!(
            script,
            NativeScript::ScriptAll(vec![
                NativeScript::ScriptPubkey(AddrKeyhash::new(key_hash)),
                NativeScript::InvalidHereafter(100),
            ])
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn any_script_happy_path_from_json() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{ "type": "any", "scripts": [ { "type": "after", "slot": 50 } ] }"#,
        )
        .unwrap();
        let script = json::native_script_from_json(&value).unwrap();
        assert_eq!(
            script,
            NativeScript::ScriptAny(vec![NativeScript::InvalidBefore(50)])
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn at_least_script_happy_path_from_json() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{ "type": "atLeast", "required": 2, "scripts": [
                { "type": "before", "slot": 10 },
                { "type": "after", "slot": 20 },
                { "type": "before", "slot": 30 }
            ] }"#,
        )
        .unwrap();
        let script = json::native_script_from_json(&value).unwrap();
        assert_eq!(
            script,
            NativeScript::ScriptNOfK(
                2,
                vec![
                    NativeScript::InvalidHereafter(10),
                    NativeScript::InvalidBefore(20),
                    NativeScript::InvalidHereafter(30),
                ]
            )
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn before_and_after_scripts_happy_path_from_json() {
        let before: serde_json::Value =
            serde_json::from_str(r#"{ "type": "before", "slot": 12345 }"#).unwrap();
        let after: serde_json::Value =
            serde_json::from_str(r#"{ "type": "after", "slot": 67890 }"#).unwrap();

        assert_eq!(
            json::native_script_from_json(&before).unwrap(),
            NativeScript::InvalidHereafter(12345)
        );
        assert_eq!(
            json::native_script_from_json(&after).unwrap(),
            NativeScript::InvalidBefore(67890)
        );
    }
}
