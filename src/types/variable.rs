use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A variable reference from the first argument of `SecRule`.
///
/// Each entry in a `|`-separated variable list selects a collection, an
/// optional member within it (`REQUEST_HEADERS:User-Agent`), and up to two
/// modifiers: `&` asks for the element count instead of the values, and `!`
/// excludes the selection from a broader one earlier in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub count: bool,
    pub exclusion: bool,
    pub collection: VariableKind,
    pub member: Option<String>,
}

impl Variable {
    pub fn new(collection: VariableKind) -> Self {
        Variable {
            count: false,
            exclusion: false,
            collection,
            member: None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count {
            f.write_str("&")?;
        }
        if self.exclusion {
            f.write_str("!")?;
        }
        write!(f, "{}", self.collection)?;
        if let Some(member) = &self.member {
            write!(f, ":{member}")?;
        }
        Ok(())
    }
}

/// The collections a rule variable may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Args,
    ArgsCombinedSize,
    ArgsGet,
    ArgsGetNames,
    ArgsNames,
    ArgsPost,
    ArgsPostNames,
    Duration,
    Env,
    Files,
    FilesCombinedSize,
    FilesNames,
    FilesSizes,
    Geo,
    Ip,
    MatchedVar,
    MatchedVarName,
    MatchedVars,
    MatchedVarsNames,
    QueryString,
    RemoteAddr,
    RemoteHost,
    RemotePort,
    RequestBasename,
    RequestBody,
    RequestBodyLength,
    RequestCookies,
    RequestCookiesNames,
    RequestFilename,
    RequestHeaders,
    RequestHeadersNames,
    RequestLine,
    RequestMethod,
    RequestProtocol,
    RequestUri,
    RequestUriRaw,
    ResponseBody,
    ResponseContentLength,
    ResponseContentType,
    ResponseHeaders,
    ResponseHeadersNames,
    ResponseProtocol,
    ResponseStatus,
    ServerAddr,
    ServerName,
    ServerPort,
    Session,
    Time,
    Tx,
    UniqueId,
    Xml,
}

impl VariableKind {
    /// The canonical SecLang spelling of this collection.
    pub fn name(self) -> &'static str {
        match self {
            VariableKind::Args => "ARGS",
            VariableKind::ArgsCombinedSize => "ARGS_COMBINED_SIZE",
            VariableKind::ArgsGet => "ARGS_GET",
            VariableKind::ArgsGetNames => "ARGS_GET_NAMES",
            VariableKind::ArgsNames => "ARGS_NAMES",
            VariableKind::ArgsPost => "ARGS_POST",
            VariableKind::ArgsPostNames => "ARGS_POST_NAMES",
            VariableKind::Duration => "DURATION",
            VariableKind::Env => "ENV",
            VariableKind::Files => "FILES",
            VariableKind::FilesCombinedSize => "FILES_COMBINED_SIZE",
            VariableKind::FilesNames => "FILES_NAMES",
            VariableKind::FilesSizes => "FILES_SIZES",
            VariableKind::Geo => "GEO",
            VariableKind::Ip => "IP",
            VariableKind::MatchedVar => "MATCHED_VAR",
            VariableKind::MatchedVarName => "MATCHED_VAR_NAME",
            VariableKind::MatchedVars => "MATCHED_VARS",
            VariableKind::MatchedVarsNames => "MATCHED_VARS_NAMES",
            VariableKind::QueryString => "QUERY_STRING",
            VariableKind::RemoteAddr => "REMOTE_ADDR",
            VariableKind::RemoteHost => "REMOTE_HOST",
            VariableKind::RemotePort => "REMOTE_PORT",
            VariableKind::RequestBasename => "REQUEST_BASENAME",
            VariableKind::RequestBody => "REQUEST_BODY",
            VariableKind::RequestBodyLength => "REQUEST_BODY_LENGTH",
            VariableKind::RequestCookies => "REQUEST_COOKIES",
            VariableKind::RequestCookiesNames => "REQUEST_COOKIES_NAMES",
            VariableKind::RequestFilename => "REQUEST_FILENAME",
            VariableKind::RequestHeaders => "REQUEST_HEADERS",
            VariableKind::RequestHeadersNames => "REQUEST_HEADERS_NAMES",
            VariableKind::RequestLine => "REQUEST_LINE",
            VariableKind::RequestMethod => "REQUEST_METHOD",
            VariableKind::RequestProtocol => "REQUEST_PROTOCOL",
            VariableKind::RequestUri => "REQUEST_URI",
            VariableKind::RequestUriRaw => "REQUEST_URI_RAW",
            VariableKind::ResponseBody => "RESPONSE_BODY",
            VariableKind::ResponseContentLength => "RESPONSE_CONTENT_LENGTH",
            VariableKind::ResponseContentType => "RESPONSE_CONTENT_TYPE",
            VariableKind::ResponseHeaders => "RESPONSE_HEADERS",
            VariableKind::ResponseHeadersNames => "RESPONSE_HEADERS_NAMES",
            VariableKind::ResponseProtocol => "RESPONSE_PROTOCOL",
            VariableKind::ResponseStatus => "RESPONSE_STATUS",
            VariableKind::ServerAddr => "SERVER_ADDR",
            VariableKind::ServerName => "SERVER_NAME",
            VariableKind::ServerPort => "SERVER_PORT",
            VariableKind::Session => "SESSION",
            VariableKind::Time => "TIME",
            VariableKind::Tx => "TX",
            VariableKind::UniqueId => "UNIQUE_ID",
            VariableKind::Xml => "XML",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown variable: {0}")]
pub struct UnknownVariable(String);

impl FromStr for VariableKind {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_uppercase().as_str() {
            "ARGS" => VariableKind::Args,
            "ARGS_COMBINED_SIZE" => VariableKind::ArgsCombinedSize,
            "ARGS_GET" => VariableKind::ArgsGet,
            "ARGS_GET_NAMES" => VariableKind::ArgsGetNames,
            "ARGS_NAMES" => VariableKind::ArgsNames,
            "ARGS_POST" => VariableKind::ArgsPost,
            "ARGS_POST_NAMES" => VariableKind::ArgsPostNames,
            "DURATION" => VariableKind::Duration,
            "ENV" => VariableKind::Env,
            "FILES" => VariableKind::Files,
            "FILES_COMBINED_SIZE" => VariableKind::FilesCombinedSize,
            "FILES_NAMES" => VariableKind::FilesNames,
            "FILES_SIZES" => VariableKind::FilesSizes,
            "GEO" => VariableKind::Geo,
            "IP" => VariableKind::Ip,
            "MATCHED_VAR" => VariableKind::MatchedVar,
            "MATCHED_VAR_NAME" => VariableKind::MatchedVarName,
            "MATCHED_VARS" => VariableKind::MatchedVars,
            "MATCHED_VARS_NAMES" => VariableKind::MatchedVarsNames,
            "QUERY_STRING" => VariableKind::QueryString,
            "REMOTE_ADDR" => VariableKind::RemoteAddr,
            "REMOTE_HOST" => VariableKind::RemoteHost,
            "REMOTE_PORT" => VariableKind::RemotePort,
            "REQUEST_BASENAME" => VariableKind::RequestBasename,
            "REQUEST_BODY" => VariableKind::RequestBody,
            "REQUEST_BODY_LENGTH" => VariableKind::RequestBodyLength,
            "REQUEST_COOKIES" => VariableKind::RequestCookies,
            "REQUEST_COOKIES_NAMES" => VariableKind::RequestCookiesNames,
            "REQUEST_FILENAME" => VariableKind::RequestFilename,
            "REQUEST_HEADERS" => VariableKind::RequestHeaders,
            "REQUEST_HEADERS_NAMES" => VariableKind::RequestHeadersNames,
            "REQUEST_LINE" => VariableKind::RequestLine,
            "REQUEST_METHOD" => VariableKind::RequestMethod,
            "REQUEST_PROTOCOL" => VariableKind::RequestProtocol,
            "REQUEST_URI" => VariableKind::RequestUri,
            "REQUEST_URI_RAW" => VariableKind::RequestUriRaw,
            "RESPONSE_BODY" => VariableKind::ResponseBody,
            "RESPONSE_CONTENT_LENGTH" => VariableKind::ResponseContentLength,
            "RESPONSE_CONTENT_TYPE" => VariableKind::ResponseContentType,
            "RESPONSE_HEADERS" => VariableKind::ResponseHeaders,
            "RESPONSE_HEADERS_NAMES" => VariableKind::ResponseHeadersNames,
            "RESPONSE_PROTOCOL" => VariableKind::ResponseProtocol,
            "RESPONSE_STATUS" => VariableKind::ResponseStatus,
            "SERVER_ADDR" => VariableKind::ServerAddr,
            "SERVER_NAME" => VariableKind::ServerName,
            "SERVER_PORT" => VariableKind::ServerPort,
            "SESSION" => VariableKind::Session,
            "TIME" => VariableKind::Time,
            "TX" => VariableKind::Tx,
            "UNIQUE_ID" => VariableKind::UniqueId,
            "XML" => VariableKind::Xml,
            _ => return Err(UnknownVariable(s.to_owned())),
        };
        Ok(kind)
    }
}
