use crate::{
    config::Config,
    error::RequestError,
    forms,
    listing::{FormListXml, IndexPage, SubmissionReceipt},
    submission,
};
use anyhow::{Result, bail};
use std::{
    io::{self, Cursor},
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    thread,
};
use tiny_http::{Header, Method, Request, Response, ResponseBox, Server, StatusCode};
use tracing::{info, warn};

pub struct FormServer {
    config: Config,
    server: Server,
}

impl FormServer {
    pub fn bind(config: Config) -> Result<Self> {
        let Ok(server) = Server::http(SocketAddrV4::new(Ipv4Addr::new(0, 0, 0, 0), config.port))
        else {
            bail!("Could not bind to port {}", config.port);
        };

        Ok(Self { config, server })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    pub fn run(&self) -> Result<()> {
        info!(
            "Serving forms from {} and storing submissions in {} on port {}",
            self.config.forms_dir.display(),
            self.config.data_dir.display(),
            self.local_addr().map_or(self.config.port, |addr| addr.port()),
        );

        thread::scope(|scope| {
            for _ in 0..self.config.threads {
                scope.spawn(|| self.serve());
            }
        });

        Ok(())
    }

    fn serve(&self) {
        loop {
            let request = match self.server.recv() {
                Ok(request) => request,
                Err(error) => {
                    warn!("Could not receive request: {error}");
                    return;
                }
            };

            self.dispatch(request);
        }
    }

    fn dispatch(&self, mut request: Request) {
        info!("{:?} {}", request.method(), request.url());

        let response = self.handle(&mut request).unwrap_or_else(|error| {
            warn!("{:?} {} failed: {error}", request.method(), request.url());
            error.into_response()
        });

        if let Err(error) = request.respond(response) {
            warn!("Could not send response: {error}");
        }
    }

    fn handle(&self, request: &mut Request) -> Result<ResponseBox, RequestError> {
        let method = request.method().clone();
        let url = request.url().split('?').next().unwrap_or_default().to_string();

        match (method, url.as_str()) {
            (Method::Get, "/") => self.index(),
            (Method::Get, "/formList") => self.form_list(request),
            (Method::Get, url) if url.starts_with("/forms/") => {
                self.form(url.strip_prefix("/forms/").unwrap_or_default())
            }
            (Method::Post, "/submission") => self.submit(request),
            _ => Err(RequestError::NotFound),
        }
    }

    fn index(&self) -> Result<ResponseBox, RequestError> {
        let forms = forms::list_forms(&self.config)?;
        let response: Response<Cursor<Vec<u8>>> =
            IndexPage::new(&forms, &self.config.allowed_types).into();

        Ok(response.boxed())
    }

    fn form_list(&self, request: &Request) -> Result<ResponseBox, RequestError> {
        let names = forms::list_xml_form_names(&self.config)?;
        let host = self.host_of(request);
        let response: Response<Cursor<Vec<u8>>> = FormListXml::new(&host, &names).into();

        Ok(response.boxed())
    }

    fn form(&self, name: &str) -> Result<ResponseBox, RequestError> {
        let name = name.replace("%20", " ");
        let form = forms::find_form(&self.config, &name)?;

        Ok(form.get_response()?.boxed())
    }

    fn submit(&self, request: &mut Request) -> Result<ResponseBox, RequestError> {
        let content_type = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Content-Type"))
            .map(|header| header.value.to_string())
            .unwrap_or_default();
        let Some(boundary) = submission::boundary(&content_type) else {
            return Err(RequestError::BadRequest("expected a multipart/form-data body".into()));
        };

        let host = self.host_of(request);
        let stored = submission::accept(&self.config, request.as_reader(), &boundary)?;

        info!(
            "Stored {} file(s) in {}",
            stored.files.len(),
            stored.directory.display(),
        );

        let location = Header::from_bytes("location", format!("http://{host}"))
            .map_err(|_| RequestError::Storage(io::Error::other("Could not create header")))?;
        let response: Response<Cursor<Vec<u8>>> = SubmissionReceipt::new(&stored).into();

        Ok(response
            .with_header(location)
            .with_status_code(StatusCode(201))
            .boxed())
    }

    fn host_of(&self, request: &Request) -> String {
        request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Host"))
            .map(|header| header.value.to_string())
            .or_else(|| self.local_addr().map(|addr| addr.to_string()))
            .unwrap_or_default()
    }
}
