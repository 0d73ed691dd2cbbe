use crate::{forms::FormFile, submission::StoredSubmission};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::{collections::BTreeSet, io::Cursor};
use tiny_http::{Header, Response};

pub struct IndexPage<'a> {
    forms: &'a [FormFile],
    allowed_types: &'a BTreeSet<String>,
}

impl<'a> IndexPage<'a> {
    pub fn new(forms: &'a [FormFile], allowed_types: &'a BTreeSet<String>) -> Self {
        Self { forms, allowed_types }
    }

    fn render(&self) -> String {
        let mut form_elements = String::new();

        for form in self.forms {
            form_elements += &format!(
                "    <li><a href=\"/forms/{}\">{}</a></li>\n",
                encode_double_quoted_attribute(&form.name.replace(' ', "%20")),
                encode_text(&form.name),
            );
        }

        let allowed_types = self
            .allowed_types
            .iter()
            .cloned()
            .collect::<Vec<String>>()
            .join(", ");
        let allowed_types = encode_text(&allowed_types);

        format!(
            r#"<html>
<body>
  <h3>XForms server</h3>
  <p>Forms available for download:</p>
  <ul>
{form_elements}  </ul>
  <p>This is a test form for uploading submissions without a client.
     Only files with the following extensions will be written to disk after upload:<br>
     <b>{allowed_types}</b></p>
  <form action="/submission" method="post" enctype="multipart/form-data">
      File 1: <input type="file" name="file1"/> <br/>
      File 2: <input type="file" name="file2"/> <br/>
      <input type="submit"/>
  </form>
</body>
</html>
"#
        )
    }
}

impl From<IndexPage<'_>> for Response<Cursor<Vec<u8>>> {
    fn from(value: IndexPage) -> Self {
        html_response(value.render())
    }
}

pub struct FormListXml<'a> {
    host: &'a str,
    names: &'a [String],
}

impl<'a> FormListXml<'a> {
    pub fn new(host: &'a str, names: &'a [String]) -> Self {
        Self { host, names }
    }

    fn render(&self) -> String {
        let mut document = String::from("<forms>\n");

        for name in self.names {
            let label = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);
            let url = format!("http://{}/forms/{}", self.host, name.replace(' ', "%20"));

            document += &format!(
                "<form url=\"{}\">{}</form>\n",
                encode_double_quoted_attribute(&url),
                encode_text(label),
            );
        }

        document + "</forms>\n"
    }
}

impl From<FormListXml<'_>> for Response<Cursor<Vec<u8>>> {
    fn from(value: FormListXml) -> Self {
        let mut response = Response::from_string(value.render());

        if let Ok(header) = Header::from_bytes("content-type", "text/xml") {
            response = response.with_header(header);
        }

        response
    }
}

pub struct SubmissionReceipt<'a> {
    stored: &'a StoredSubmission,
}

impl<'a> SubmissionReceipt<'a> {
    pub fn new(stored: &'a StoredSubmission) -> Self {
        Self { stored }
    }

    fn render(&self) -> String {
        let mut lines = String::new();

        for name in &self.stored.files {
            lines += &format!(
                "Stored: {}<br>\n",
                encode_text(&self.stored.directory.join(name).to_string_lossy()),
            );
        }

        lines
    }
}

impl From<SubmissionReceipt<'_>> for Response<Cursor<Vec<u8>>> {
    fn from(value: SubmissionReceipt) -> Self {
        html_response(value.render())
    }
}

fn html_response(html: String) -> Response<Cursor<Vec<u8>>> {
    let mut response = Response::from_string(html);

    if let Ok(header) = Header::from_bytes("content-type", "text/html") {
        response = response.with_header(header);
    }

    response
}
