//! Program descriptor: program id, entry points and account discriminator
//!
//! Loaded once at startup from the program's Anchor IDL. Both the legacy
//! layout (`metadata.address`, camelCase names, no discriminators) and the
//! 0.30+ layout (top-level `address`, explicit discriminators) are accepted.

use crate::error::ConfigError;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Default entry point creating the store account
pub const DEFAULT_INITIALIZE_INSTRUCTION: &str = "start_stuff_off";
/// Default entry point appending a record
pub const DEFAULT_APPEND_INSTRUCTION: &str = "add_meme";
/// Default store account type
pub const DEFAULT_STORE_ACCOUNT: &str = "BaseAccount";

/// An instruction entry point and its 8-byte selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub discriminator: [u8; 8],
}

impl EntryPoint {
    /// Entry point using Anchor's `global:<snake_name>` sighash
    pub fn global(name: &str) -> Self {
        let name = to_snake_case(name);
        Self {
            discriminator: sighash("global", &name),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDescriptor {
    pub program_id: Pubkey,
    pub initialize: EntryPoint,
    pub append: EntryPoint,
    pub account_discriminator: [u8; 8],
}

/// Which IDL entries back the store protocol
#[derive(Debug, Clone)]
pub struct EntryPointNames {
    pub initialize: String,
    pub append: String,
    pub account: String,
}

impl Default for EntryPointNames {
    fn default() -> Self {
        Self {
            initialize: DEFAULT_INITIALIZE_INSTRUCTION.to_string(),
            append: DEFAULT_APPEND_INSTRUCTION.to_string(),
            account: DEFAULT_STORE_ACCOUNT.to_string(),
        }
    }
}

/// Borsh field layout of [`StoreAccount`](crate::record::StoreAccount)
const STORE_ACCOUNT_LAYOUT: [&str; 2] = ["u64", "vec<struct{string,pubkey}>"];
/// Arguments of the append entry point; initialize takes none
const APPEND_ARGS: [&str; 1] = ["string"];

const MAX_TYPE_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
struct Idl {
    address: Option<String>,
    metadata: Option<IdlMetadata>,
    #[serde(default)]
    instructions: Vec<IdlInstruction>,
    #[serde(default)]
    accounts: Vec<IdlAccount>,
    #[serde(default)]
    types: Vec<IdlTypeDecl>,
}

#[derive(Debug, Deserialize)]
struct IdlMetadata {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdlInstruction {
    name: String,
    discriminator: Option<[u8; 8]>,
    #[serde(default)]
    args: Vec<IdlField>,
}

/// Legacy IDLs inline the account layout; 0.30+ IDLs move it to `types`
#[derive(Debug, Deserialize)]
struct IdlAccount {
    name: String,
    discriminator: Option<[u8; 8]>,
    #[serde(rename = "type")]
    ty: Option<IdlTypeDef>,
}

#[derive(Debug, Deserialize)]
struct IdlTypeDecl {
    name: String,
    #[serde(rename = "type")]
    ty: IdlTypeDef,
}

#[derive(Debug, Deserialize)]
struct IdlTypeDef {
    #[serde(default)]
    kind: String,
    /// Named `{name, type}` entries, or bare types for tuple structs
    #[serde(default)]
    fields: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct IdlField {
    #[serde(rename = "type")]
    ty: Value,
}

impl ProgramDescriptor {
    /// Descriptor with the default entry points, discriminators derived from names
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            initialize: EntryPoint::global(DEFAULT_INITIALIZE_INSTRUCTION),
            append: EntryPoint::global(DEFAULT_APPEND_INSTRUCTION),
            account_discriminator: sighash("account", DEFAULT_STORE_ACCOUNT),
        }
    }

    /// Load an IDL file from disk
    pub fn load(path: &str, names: &EntryPointNames) -> Result<Self, ConfigError> {
        let path = shellexpand::tilde(path).to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_idl_json(&content, names)
    }

    pub fn from_idl_json(json: &str, names: &EntryPointNames) -> Result<Self, ConfigError> {
        let idl: Idl = serde_json::from_str(json)?;

        let address = idl
            .address
            .or_else(|| idl.metadata.and_then(|m| m.address))
            .ok_or_else(|| ConfigError::InvalidProgramId("IDL carries no address".to_string()))?;
        let program_id = Pubkey::from_str(&address)
            .map_err(|e| ConfigError::InvalidProgramId(format!("{}: {}", address, e)))?;

        let (initialize_item, initialize) =
            find_instruction(&idl.instructions, &names.initialize)?;
        let (append_item, append) = find_instruction(&idl.instructions, &names.append)?;
        check_layout(
            &format!("instruction {} arguments", initialize.name),
            &render_fields(initialize_item.args.iter().map(|a| &a.ty), &idl.types, 0)?,
            &[],
        )?;
        check_layout(
            &format!("instruction {} arguments", append.name),
            &render_fields(append_item.args.iter().map(|a| &a.ty), &idl.types, 0)?,
            &APPEND_ARGS,
        )?;

        let account = idl
            .accounts
            .iter()
            .find(|a| a.name == names.account)
            .ok_or_else(|| ConfigError::MissingAccount(names.account.clone()))?;
        let account_discriminator = account
            .discriminator
            .unwrap_or_else(|| sighash("account", &account.name));

        let layout = match &account.ty {
            Some(ty) => ty,
            None => &find_type(&idl.types, &account.name)?.ty,
        };
        check_layout(
            &format!("account {}", account.name),
            &render_struct(layout, &idl.types, 0)?,
            &STORE_ACCOUNT_LAYOUT,
        )?;

        Ok(Self {
            program_id,
            initialize,
            append,
            account_discriminator,
        })
    }
}

fn find_instruction<'a>(
    items: &'a [IdlInstruction],
    wanted: &str,
) -> Result<(&'a IdlInstruction, EntryPoint), ConfigError> {
    let wanted = to_snake_case(wanted);
    let item = items
        .iter()
        .find(|i| to_snake_case(&i.name) == wanted)
        .ok_or_else(|| ConfigError::MissingInstruction(wanted.clone()))?;

    let entry_point = match item.discriminator {
        Some(discriminator) => EntryPoint {
            name: wanted,
            discriminator,
        },
        None => EntryPoint::global(&wanted),
    };
    Ok((item, entry_point))
}

fn find_type<'a>(types: &'a [IdlTypeDecl], name: &str) -> Result<&'a IdlTypeDecl, ConfigError> {
    types
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| ConfigError::SchemaMismatch(format!("undefined type {}", name)))
}

fn check_layout(what: &str, found: &[String], expected: &[&str]) -> Result<(), ConfigError> {
    if found.iter().map(String::as_str).eq(expected.iter().copied()) {
        return Ok(());
    }
    Err(ConfigError::SchemaMismatch(format!(
        "{} is [{}], expected [{}]",
        what,
        found.join(", "),
        expected.join(", ")
    )))
}

fn render_fields<'a>(
    fields: impl Iterator<Item = &'a Value>,
    types: &[IdlTypeDecl],
    depth: usize,
) -> Result<Vec<String>, ConfigError> {
    fields.map(|ty| render_type(ty, types, depth)).collect()
}

fn render_struct(
    def: &IdlTypeDef,
    types: &[IdlTypeDecl],
    depth: usize,
) -> Result<Vec<String>, ConfigError> {
    if def.kind != "struct" {
        return Err(ConfigError::SchemaMismatch(format!(
            "expected a struct, found kind {:?}",
            def.kind
        )));
    }
    // Borsh encodes fields in order; names do not matter
    let field_types = def.fields.iter().map(|f| f.get("type").unwrap_or(f));
    render_fields(field_types, types, depth)
}

/// Canonical spelling of an IDL type, resolving `defined` references
///
/// Both `publicKey` (legacy) and `pubkey` (0.30+) render as `pubkey`.
fn render_type(ty: &Value, types: &[IdlTypeDecl], depth: usize) -> Result<String, ConfigError> {
    if depth > MAX_TYPE_DEPTH {
        return Err(ConfigError::SchemaMismatch("type nesting too deep".to_string()));
    }

    let rendered = match ty {
        Value::String(name) => match name.as_str() {
            "publicKey" | "pubkey" => "pubkey".to_string(),
            other => other.to_string(),
        },
        Value::Object(map) => {
            if let Some(inner) = map.get("vec") {
                format!("vec<{}>", render_type(inner, types, depth + 1)?)
            } else if let Some(inner) = map.get("option") {
                format!("option<{}>", render_type(inner, types, depth + 1)?)
            } else if let Some(Value::Array(parts)) = map.get("array") {
                match parts.as_slice() {
                    [inner, len] => {
                        let inner = render_type(inner, types, depth + 1)?;
                        format!("[{};{}]", inner, len)
                    }
                    _ => ty.to_string(),
                }
            } else if let Some(defined) = map.get("defined") {
                let name = defined
                    .as_str()
                    .or_else(|| defined.get("name").and_then(Value::as_str))
                    .ok_or_else(|| {
                        ConfigError::SchemaMismatch(format!("malformed type reference {}", defined))
                    })?;
                let fields = render_struct(&find_type(types, name)?.ty, types, depth + 1)?;
                format!("struct{{{}}}", fields.join(","))
            } else {
                ty.to_string()
            }
        }
        other => other.to_string(),
    };
    Ok(rendered)
}

/// Anchor discriminator: first 8 bytes of sha256("<namespace>:<name>")
pub fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", namespace, name).as_bytes());
    let hash = hasher.finalize();
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}

/// `startStuffOff` -> `start_stuff_off`, `addURL` -> `add_url`
///
/// Matches Anchor's conversion: a run of capitals is one word, and the last
/// capital of a run starts a new word when a lowercase letter follows it.
fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let starts_word = match i.checked_sub(1).map(|p| chars[p]) {
                Some(prev) if prev.is_ascii_lowercase() || prev.is_ascii_digit() => true,
                Some(prev) if prev.is_ascii_uppercase() => next_is_lower,
                _ => false,
            };
            if starts_word {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
