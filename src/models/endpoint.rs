use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => XLSX_MIME,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Xlsx => "Excel",
        }
    }
}

/// What a response must look like to pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Protected endpoint called without credentials.
    Unauthorized,
    /// `{ "success": true, "data": ... }`
    SuccessEnvelope,
    /// `{ "success": false, "error": "<message>" }`
    ErrorEnvelope,
    /// `Content-Type` must contain the given MIME type (a 401 is tolerated).
    ContentType(&'static str),
    Export(ExportFormat),
    Redirect { location_contains: &'static str },
    StatusOnly,
}

/// Where a path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Api,
    Page,
}

#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    pub surface: Surface,
    pub expected_status: Vec<u16>,
    pub shape: Shape,
    pub critical: bool,
    pub body: Option<Value>,
    pub authenticated: bool,
}

impl EndpointSpec {
    pub fn api(name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            surface: Surface::Api,
            expected_status: vec![200],
            shape: Shape::StatusOnly,
            critical: false,
            body: None,
            authenticated: false,
        }
    }

    pub fn page(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            surface: Surface::Page,
            ..Self::api(name, HttpMethod::Get, path)
        }
    }

    /// Sets the shape and the status codes it is normally paired with.
    pub fn expect(mut self, shape: Shape) -> Self {
        self.expected_status = match &shape {
            Shape::Unauthorized => vec![401],
            Shape::ErrorEnvelope => vec![400, 401, 404, 500],
            Shape::Redirect { .. } => vec![302, 303, 307],
            _ => vec![200],
        };
        self.shape = shape;
        self
    }

    pub fn statuses(mut self, statuses: &[u16]) -> Self {
        self.expected_status = statuses.to_vec();
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    pub fn expects_status(&self, status: u16) -> bool {
        self.expected_status.contains(&status)
    }
}
