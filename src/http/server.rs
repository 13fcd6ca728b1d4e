use log::info;
use rouille::{Request, Response};
use serde::Deserialize;
use std::{path::PathBuf, sync::Arc};

use crate::{
    config::{HttpConfig, LibraryConfig},
    domain::track::{FieldName, FieldUpdates},
    http::error::ApiError,
    library::Library,
    remote::ImageFetcher,
};

pub struct HttpServer {
    library: Library,
    library_config: LibraryConfig,
    fetcher: Arc<dyn ImageFetcher>,
    pub config: HttpConfig,
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct AlbumsRequest {
    file_paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct EmbedRequest {
    file_paths: Vec<PathBuf>,
    image_url: String,
}

/// Only the fields present in the body are written.
#[derive(Debug, Deserialize)]
struct UpdateMetaRequest {
    file_paths: Vec<PathBuf>,
    title: Option<String>,
    artist: Option<String>,
    album_artist: Option<String>,
    album: Option<String>,
    year: Option<String>,
    genre: Option<String>,
    composer: Option<String>,
}

impl UpdateMetaRequest {
    fn updates(&self) -> FieldUpdates {
        [
            (FieldName::Title, &self.title),
            (FieldName::Artist, &self.artist),
            (FieldName::AlbumArtist, &self.album_artist),
            (FieldName::Album, &self.album),
            (FieldName::Year, &self.year),
            (FieldName::Genre, &self.genre),
            (FieldName::Composer, &self.composer),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.clone().map(|v| (field, v)))
        .collect()
    }
}

impl HttpServer {
    pub fn new(
        library_config: LibraryConfig,
        config: HttpConfig,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            library: Library::new(&library_config),
            library_config,
            fetcher,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let result = rouille::router!(request,
            (POST) (/api/library/scan) => {
                self.handle_scan(request)
            },
            (POST) (/api/library/albums) => {
                self.handle_albums(request)
            },
            (GET) (/api/library/cover) => {
                self.handle_cover(request)
            },
            (POST) (/api/library/embed) => {
                self.handle_embed(request)
            },
            (POST) (/api/library/update_meta) => {
                self.handle_update_meta(request)
            },
            _ => Ok(Response::empty_404())
        );

        let response = result.unwrap_or_else(ApiError::into_response);
        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn json_body<T: serde::de::DeserializeOwned>(request: &Request) -> Result<T, ApiError> {
        rouille::input::json_input(request)
            .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
    }

    fn handle_scan(&self, request: &Request) -> Result<Response, ApiError> {
        let body: ScanRequest = Self::json_body(request)?;
        let root = body
            .path
            .unwrap_or_else(|| self.library_config.default_root());
        let albums = self.library.scan(&root)?;
        Ok(Response::json(&albums))
    }

    fn handle_albums(&self, request: &Request) -> Result<Response, ApiError> {
        let body: AlbumsRequest = Self::json_body(request)?;
        Ok(Response::json(&self.library.albums_from_paths(&body.file_paths)))
    }

    fn handle_cover(&self, request: &Request) -> Result<Response, ApiError> {
        let path = request
            .get_param("path")
            .ok_or_else(|| ApiError::BadRequest("missing path parameter".into()))?;

        match self.library.get_cover_bytes(&PathBuf::from(&path))? {
            Some(cover) => {
                log::debug!("COVER {} -> {} ({} bytes)", path, cover.mime_type, cover.data.len());
                Ok(Response::from_data(cover.mime_type, cover.data))
            }
            None => Err(ApiError::NotFound(format!("no cover for {path}"))),
        }
    }

    fn handle_embed(&self, request: &Request) -> Result<Response, ApiError> {
        let body: EmbedRequest = Self::json_body(request)?;
        let report = self.library.embed_cover_from_url(
            &body.file_paths,
            &body.image_url,
            self.fetcher.as_ref(),
        )?;
        Ok(Response::json(&report))
    }

    fn handle_update_meta(&self, request: &Request) -> Result<Response, ApiError> {
        let body: UpdateMetaRequest = Self::json_body(request)?;
        let report = self
            .library
            .update_fields(&body.file_paths, &body.updates());
        Ok(Response::json(&report))
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
