/*!
# CSV Uploader

A web front-end for a CSV-backed record store, built in Rust.

## Overview

Users upload a CSV file, preview it, and send it to the backend. They can then
browse the stored records page by page, search by field and value, add, edit or
delete records, and download the whole data set as a CSV file.

## Architecture

The front-end is an axum server that renders HTML pages and keeps each
browser's state in process, keyed by a `session` cookie. The records live in a
separate backend reached over HTTP.

### Front-end Layer
- **Technologies**: Rust, axum, handlebars
- **Key Components**:
  - CSV Parser - Splits uploaded text into rows of cells
  - Tabular State Store - Current rows, page cursor, total count, active filter
  - Record Form Controller - One form for both adding and editing records
  - Table Renderer - Preview and browse layouts of the same rows
  - Page Orchestrators - Upload, browse and edit routes

### Backend Layer
- Reached through the [`api::RecordsApi`] trait
- Default base URL `http://localhost:8150/csv-uploader/api`

## Modules

- **loader**: CSV parsing and the trailing blank line policy
- **record**: Record fields, list response decoding, date validation
- **api**: Backend client
- **store**: Paginated and filtered record sets
- **form**: Add/edit state machine
- **table**: Table layout for preview and browse
- **downloader**: CSV export download
- **config**: Command line and environment settings
- **error**: The crate error type
- **app**: Router and server startup
- **pages**: Route handlers

## Routes

- `/` - Redirects to `/upload`
- `/upload` - Choose, preview and send a CSV file
- `/consultar` - Browse, search, add and delete records
- `/editar/{id}` - Edit one record
*/

pub mod api;
pub mod app;
pub mod config;
pub mod downloader;
pub mod error;
pub mod form;
pub mod loader;
pub mod pages;
pub mod record;
pub mod store;
pub mod table;

pub use error::{Error, Result};
