// ABOUTME: System-wide constants and configuration defaults for the ScanBar server
// ABOUTME: Holds ports, external API defaults, limits and user-facing response messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module
//!
//! Application constants shared by configuration, routes and services.

/// Service identity
pub mod service {
    /// Service name used in logs
    pub const SERVICE_NAME: &str = "scanbar-server";
    /// Server version from Cargo.toml
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Network defaults
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 3000;
    /// Default bind host
    pub const DEFAULT_HOST: &str = "0.0.0.0";
}

/// Defaults for configurable values
pub mod defaults {
    /// Default `SQLite` database location
    pub const DATABASE_URL: &str = "sqlite:./data/scanbar.db";
    /// Session token lifetime in days
    pub const JWT_EXPIRY_DAYS: i64 = 7;
    /// Issuer substring marking tokens minted by the external identity provider
    pub const IDENTITY_PROVIDER_ISSUER_HINT: &str = "supabase";
    /// Model used for food analysis and image recognition
    pub const GENERATIVE_MODEL: &str = "gemini-1.5-flash-latest";
    /// Model used by the chatbot
    pub const CHATBOT_MODEL: &str = "gemini-2.5-flash-lite";
    /// Open Food Facts API root
    pub const OPEN_FOOD_FACTS_BASE_URL: &str = "https://world.openfoodfacts.org";
    /// Timeout for product lookups
    pub const OPEN_FOOD_FACTS_TIMEOUT_SECS: u64 = 8;
    /// `NewsAPI` root
    pub const NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";
    /// Timeout for news lookups
    pub const NEWS_API_TIMEOUT_SECS: u64 = 10;
    /// Public URL of this API, used for verification links
    pub const PUBLIC_BASE_URL: &str = "http://localhost:3000";
    /// Frontend URL, used for password reset links
    pub const FRONTEND_BASE_URL: &str = "http://localhost:5173";
    /// Placeholder image for admin-entered products without a picture
    pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/400?text=No+Image";
    /// Whole-request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;
    /// Body limit, sized for base64 encoded photos
    pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;
}

/// Limits applied by routes and services
pub mod limits {
    /// Minimum number of digits for a product barcode lookup
    pub const MIN_BARCODE_DIGITS: usize = 8;
    /// Random bytes in verification and reset tokens
    pub const TOKEN_BYTES: usize = 20;
    /// Password reset token validity in minutes
    pub const RESET_TOKEN_TTL_MINUTES: i64 = 15;
    /// Product requests returned by the admin listing
    pub const PRODUCT_REQUEST_LIST_LIMIT: i64 = 100;
    /// Chat history messages forwarded to the model
    pub const CHAT_HISTORY_WINDOW: usize = 10;
    /// Chatbot output budget
    pub const CHAT_MAX_OUTPUT_TOKENS: u32 = 1000;
    /// Chatbot sampling temperature
    pub const CHAT_TEMPERATURE: f32 = 0.7;
    /// Articles requested per news query
    pub const NEWS_PAGE_SIZE: u32 = 10;
    /// Open Food Facts lookup cache lifetime
    pub const PRODUCT_CACHE_TTL_SECS: u64 = 300;
    /// Cached health articles not refreshed within this window are dropped
    pub const ARTICLE_CACHE_RETENTION_DAYS: i64 = 7;
}

/// Product sources stored with each cached product
pub mod product_sources {
    /// Fetched from Open Food Facts
    pub const OPEN_FOOD_FACTS: &str = "open_food_facts";
    /// Entered by an administrator
    pub const LOCAL_ADMIN_INPUT: &str = "local_admin_input";
    /// Created from product data sent along with a favorite
    pub const USER_FAVORITE: &str = "user_favorite";
}

/// User-facing messages returned by the API
pub mod messages {
    // Authentication
    /// No bearer token
    pub const NO_TOKEN: &str = "Akses ditolak, tidak ada token.";
    /// Bearer token rejected
    pub const INVALID_TOKEN: &str = "Token tidak valid.";
    /// Caller has no profile
    pub const PROFILE_NOT_FOUND: &str = "Akses ditolak. Profil tidak ditemukan.";
    /// Caller is not an administrator
    pub const NOT_ADMIN: &str = "Akses ditolak. Anda bukan Admin.";

    // Users
    /// Registration body incomplete
    pub const REGISTER_FIELDS_REQUIRED: &str = "Nama, email, dan password wajib diisi";
    /// Reset body without a password
    pub const PASSWORD_REQUIRED: &str = "Password baru wajib diisi";
    /// Email already used
    pub const EMAIL_TAKEN: &str = "Email sudah terdaftar";
    /// Registration accepted
    pub const REGISTERED: &str = "Registrasi berhasil! Silakan cek email Anda untuk verifikasi.";
    /// Wrong email or password
    pub const BAD_CREDENTIALS: &str = "Email atau password salah";
    /// Account not verified yet
    pub const NOT_VERIFIED: &str = "Akun Anda belum diverifikasi. Silakan cek email Anda.";
    /// User missing
    pub const USER_NOT_FOUND: &str = "User tidak ditemukan";
    /// Forgot password reply, identical whether or not the email exists
    pub const RESET_LINK_SENT: &str = "Jika email terdaftar, link reset akan dikirim.";
    /// Reset token rejected
    pub const RESET_TOKEN_INVALID: &str = "Token tidak valid atau sudah kedaluwarsa.";
    /// Password changed
    pub const PASSWORD_CHANGED: &str = "Password berhasil diubah.";
    /// Verification page for a bad token
    pub const VERIFY_FAILED_HTML: &str = "<h1>Token verifikasi tidak valid atau sudah digunakan!</h1>";
    /// Verification page on success
    pub const VERIFY_OK_HTML: &str =
        "<h1>Email berhasil diverifikasi!</h1><p>Anda sekarang bisa login ke aplikasi ScanBar.</p>";

    // Foods
    /// Journal entry without a name
    pub const FOOD_NAME_REQUIRED: &str = "Nama makanan wajib diisi";
    /// No analysis stored for today
    pub const ANALYSIS_NOT_FOUND: &str = "Analisis hari ini belum tersedia";
    /// Legacy barcode lookup transport failure
    pub const BARCODE_LOOKUP_FAILED: &str = "Server Error saat mencari data barcode.";
    /// Food entry missing
    pub const FOOD_NOT_FOUND: &str = "Makanan tidak ditemukan";
    /// Food entry owned by somebody else
    pub const FOOD_NOT_OWNED: &str = "User tidak diotorisasi";
    /// Food entry removed
    pub const FOOD_DELETED: &str = "Makanan dihapus";
    /// Legacy barcode lookup miss
    pub const OFF_PRODUCT_NOT_FOUND: &str =
        "Produk dengan barcode ini tidak ditemukan di database Open Food Facts.";
    /// Default name when Open Food Facts has none
    pub const NAME_UNAVAILABLE: &str = "Nama tidak tersedia";

    // Products
    /// Empty barcode
    pub const BARCODE_INVALID: &str = "Kode barcode tidak valid";
    /// Barcode with too few digits
    pub const BARCODE_TOO_SHORT: &str = "Kode barcode terlalu pendek";
    /// Nothing found anywhere
    pub const PRODUCT_NOT_FOUND_ANYWHERE: &str = "Produk tidak ditemukan di database manapun";
    /// Found but without usable nutrition data
    pub const PRODUCT_INCOMPLETE: &str = "Produk ditemukan tetapi data nutrisi tidak lengkap";
    /// Suggest manual entry
    pub const SUGGEST_MANUAL_INPUT: &str =
        "Silakan gunakan fitur input manual untuk menambahkan produk ini";
    /// Suggest completing nutrition manually
    pub const SUGGEST_COMPLETE_NUTRITION: &str =
        "Silakan gunakan fitur input manual untuk melengkapi data nutrisi";
    /// Upstream timed out
    pub const UPSTREAM_TIMEOUT: &str = "Koneksi ke server data eksternal timeout";
    /// Upstream failed
    pub const UPSTREAM_FAILED: &str = "Gagal menghubungi server data eksternal";
    /// Retry or enter manually
    pub const SUGGEST_RETRY: &str = "Silakan coba lagi atau gunakan input manual";
    /// Default product name when Open Food Facts has none
    pub const UNNAMED_PRODUCT: &str = "Tanpa Nama";
    /// Default brand
    pub const UNKNOWN_BRAND: &str = "Tidak Diketahui";
    /// Admin create without required fields
    pub const PRODUCT_FIELDS_REQUIRED: &str = "Kode barcode dan nama produk wajib diisi!";
    /// Admin create on an existing barcode
    pub const PRODUCT_EXISTS: &str = "Produk dengan barcode ini sudah ada di database!";
    /// Admin create succeeded
    pub const PRODUCT_SAVED: &str = "Produk berhasil disimpan!";
    /// Product missing
    pub const PRODUCT_NOT_FOUND: &str = "Produk tidak ditemukan";
    /// Admin update succeeded
    pub const PRODUCT_UPDATED: &str = "Produk berhasil diupdate!";
    /// Admin delete succeeded
    pub const PRODUCT_DELETED: &str = "Produk berhasil dihapus!";
    /// Notes stored when an admin adds the requested product
    pub const NOTE_PRODUCT_ADDED: &str = "Product added by admin";
    /// Notes stored on bulk resolution
    pub const NOTE_BULK_RESOLVED: &str = "Product has been added to database";

    // Favorites
    /// Missing product code
    pub const PRODUCT_CODE_REQUIRED: &str = "productCode diperlukan";
    /// Missing product and no data to create it
    pub const FAVORITE_PRODUCT_MISSING: &str =
        "Produk tidak ditemukan dan data produk tidak disertakan";
    /// Favorite removed
    pub const FAVORITE_REMOVED: &str = "Dihapus dari favorit";
    /// Favorite added
    pub const FAVORITE_ADDED: &str = "Ditambahkan ke favorit";

    // Admin
    /// Unknown request status
    pub const STATUS_INVALID: &str = "Status tidak valid";
    /// Product request missing
    pub const REQUEST_NOT_FOUND: &str = "Request tidak ditemukan";
    /// Product request status changed
    pub const STATUS_UPDATED: &str = "Status berhasil diupdate";
    /// Product request removed
    pub const REQUEST_DELETED: &str = "Request berhasil dihapus";
    /// Bulk update without barcode
    pub const BARCODE_REQUIRED: &str = "Barcode diperlukan";
    /// User restored
    pub const USER_RESTORED: &str = "Pengguna berhasil dipulihkan!";
    /// Refusing to delete another administrator
    pub const CANNOT_DELETE_ADMIN: &str = "TIDAK BOLEH menghapus sesama Admin!";
    /// User soft deleted
    pub const USER_DEACTIVATED: &str = "Pengguna berhasil dinonaktifkan (Soft Delete)";
    /// User hard deleted
    pub const USER_PURGED: &str = "User berhasil dihapus permanen";

    // Chatbot and articles
    /// Chatbot failure
    pub const CHAT_FAILED: &str = "Maaf, terjadi kesalahan. Coba lagi ya!";
    /// Article without description
    pub const NO_DESCRIPTION: &str = "Tidak ada deskripsi tersedia";
    /// News key missing
    pub const NEWS_KEY_MISSING: &str = "NEWS_API_KEY belum diset di environment variables";
    /// News key rejected upstream
    pub const NEWS_KEY_INVALID: &str =
        "API key tidak valid atau belum diverifikasi. Cek https://newsapi.org";
    /// News rate limited
    pub const NEWS_RATE_LIMITED: &str = "Terlalu banyak request. Coba lagi nanti.";
    /// News failure
    pub const NEWS_FAILED: &str = "Gagal mengambil artikel kesehatan";
}
