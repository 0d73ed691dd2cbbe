use crate::{config::Config, error::RequestError};
use mime_guess::{Mime, from_path};
use natord::compare_ignore_case;
use std::{
    fs::{File, read_dir},
    io,
    path::{Path, PathBuf},
};
use tiny_http::{Header, Response};

pub struct FormFile {
    pub name: String,
    pub path: PathBuf,
    pub mime: Mime,
}

impl FormFile {
    pub fn new(name: String, path: PathBuf) -> Self {
        let mime = from_path(&path).first_or_octet_stream();

        Self { name, path, mime }
    }

    pub fn get_response(&self) -> Result<Response<File>, RequestError> {
        let file = File::open(&self.path)?;
        let header = Header::from_bytes("content-type", self.mime.essence_str())
            .map_err(|_| RequestError::Storage(io::Error::other("Could not create header")))?;

        Ok(Response::from_file(file).with_header(header))
    }
}

pub fn extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|extension| extension.to_str())
}

pub fn list_forms(config: &Config) -> Result<Vec<FormFile>, RequestError> {
    let forms = file_names(&config.forms_dir)?
        .into_iter()
        .filter(|name| extension(name).is_some_and(|extension| config.allows(extension)))
        .map(|name| {
            let path = config.forms_dir.join(&name);
            FormFile::new(name, path)
        })
        .collect();

    Ok(forms)
}

pub fn list_xml_form_names(config: &Config) -> Result<Vec<String>, RequestError> {
    let names = file_names(&config.forms_dir)?
        .into_iter()
        .filter(|name| {
            extension(name).is_some_and(|extension| extension.eq_ignore_ascii_case("xml"))
        })
        .collect();

    Ok(names)
}

pub fn find_form(config: &Config, name: &str) -> Result<FormFile, RequestError> {
    // Match against enumerated entries instead of joining the raw name onto a path
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(RequestError::NotFound);
    }

    list_forms(config)?
        .into_iter()
        .find(|form| form.name == name)
        .ok_or(RequestError::NotFound)
}

fn file_names(forms_dir: &Path) -> Result<Vec<String>, RequestError> {
    let mut names = vec![];

    for entry in read_dir(forms_dir)? {
        let Ok(entry) = entry else { continue };
        let is_file = entry.file_type().is_ok_and(|file_type| file_type.is_file());

        if !is_file {
            continue;
        }

        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }

    names.sort_by(|a, b| compare_ignore_case(a, b));

    Ok(names)
}
