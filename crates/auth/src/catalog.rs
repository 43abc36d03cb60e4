//! The application's static route table and sidebar.

use crate::guard::first_segment;
use crate::{Guard, MenuItem, Route, RouteAccess};

pub const DASHBOARD: &str = "dashboard";

fn public(path: &str, title: &str) -> Route {
    Route::new(path, title).guarded([Guard::Anonymous])
}

fn private(path: &str, title: &str) -> Route {
    Route::new(path, title).guarded([Guard::Authenticated])
}

fn restricted(path: &str, title: &str, permission: &'static str) -> Route {
    Route::new(path, title)
        .guarded([Guard::Authenticated, Guard::Authorized])
        .requiring(RouteAccess::any_of([permission]))
}

/// Every navigable route, matched by first path segment.
pub fn routes() -> Vec<Route> {
    vec![
        public("login", "Iniciar Sesión"),
        public("register", "Crear Cuenta"),
        public("forgot-password", "Recuperar Contraseña"),
        public("reset-password", "Restablecer Contraseña"),
        public("verify-email", "Verificar Email"),
        private(DASHBOARD, "Dashboard"),
        restricted("users", "Usuarios", "users.read"),
        restricted("roles", "Roles", "roles.read"),
        // Gated on roles.read, not permissions.read, while the sidebar entry
        // uses permissions.read.
        restricted("permissions", "Permisos", "roles.read"),
        private("profile", "Mi Perfil"),
        private("shifts", "Turnos"),
        private("rates", "Tarifas"),
        private("parkings", "Parqueo"),
        private("document-types", "Tipos de Documento"),
        private("payment-types", "Tipos de Pago"),
    ]
}

/// Route for `url`; unknown paths resolve to the dashboard.
pub fn find_route(url: &str) -> Route {
    let segment = first_segment(url);
    let mut table = routes();
    let index = table
        .iter()
        .position(|r| r.path == segment)
        .or_else(|| table.iter().position(|r| r.path == DASHBOARD))
        .unwrap_or_default();
    table.swap_remove(index)
}

/// The sidebar, unfiltered.
pub fn menu() -> Vec<MenuItem> {
    vec![
        MenuItem::section("PANEL PRINCIPAL"),
        MenuItem::link("Dashboard", "/dashboard", "fa-solid fa-gauge-high").with_badge("info", "INICIO"),
        MenuItem::section("GESTIÓN DE ACCESOS").requiring(["users.read"]),
        MenuItem::link("Usuarios", "/users", "fa-solid fa-user").requiring(["users.read"]),
        MenuItem::link("Roles", "/roles", "fa-solid fa-shield-halved").requiring(["roles.read"]),
        MenuItem::link("Permisos", "/permissions", "fa-solid fa-lock").requiring(["permissions.read"]),
        MenuItem::section("GESTIÓN DE PARKING"),
        MenuItem::link("Turnos", "/shifts", "fa-solid fa-clock-rotate-left").requiring(["shifts.read"]),
        MenuItem::link("Tarifas", "/rates", "fa-solid fa-coins").requiring(["rates.read"]),
        MenuItem::link("Parqueo", "/parkings", "fa-solid fa-parking"),
        MenuItem::link("Tipos de Documento", "/document-types", "fa-solid fa-id-card"),
        MenuItem::link("Tipos de Pago", "/payment-types", "fa-solid fa-money-check"),
        MenuItem::link("Clientes", "/customers", "fa-solid fa-users"),
        MenuItem::link("Vehículos", "/vehicles", "fa-solid fa-car"),
        MenuItem::link("Infracciones", "/infractions", "fa-solid fa-triangle-exclamation"),
        MenuItem::link("Transacciones Activas", "/transactions/active", "fa-solid fa-clock"),
        MenuItem::link("Registrar Entrada", "/transactions/entry", "fa-solid fa-right-to-bracket"),
        MenuItem::link("Registrar Salida", "/transactions/exit", "fa-solid fa-right-from-bracket"),
        MenuItem::link("Procesar Pago", "/transactions/payment", "fa-solid fa-money-bill-wave"),
        MenuItem::link("Historial Transacciones", "/transactions", "fa-solid fa-list"),
        MenuItem::link("Gestión de Espacios", "/spaces", "fa-solid fa-table-cells"),
        MenuItem::group(
            "Gestión de Pagos",
            "fa-solid fa-credit-card",
            vec![
                MenuItem::link("Historial de Pagos", "/payments", "fa-solid fa-list"),
                MenuItem::link("Tipos de Pago", "/payment-types", "fa-solid fa-money-check"),
            ],
        ),
        MenuItem::group(
            "Reportes Parking",
            "fa-solid fa-chart-simple",
            vec![
                MenuItem::link("Reporte Diario", "/reports/daily", "fa-solid fa-calendar-day"),
                MenuItem::link("Reporte de Ingresos", "/reports/revenue", "fa-solid fa-sack-dollar"),
                MenuItem::link("Reporte de Ocupación", "/reports/occupancy", "fa-solid fa-chart-pie"),
            ],
        ),
        MenuItem::section("MONITOREO Y CONTROL IoT"),
        MenuItem::link("Dashboard IoT", "/iot/dashboard", "fa-solid fa-microchip"),
        MenuItem::link("Barreras", "/iot/barriers", "fa-solid fa-road-barrier"),
        MenuItem::section("CONFIGURACIÓN DEL SISTEMA").requiring(["users.delete"]),
        MenuItem::link("Configuración General", "/settings/general", "fa-solid fa-gear").requiring(["users.delete"]),
        MenuItem::section("SOPORTE"),
        MenuItem::link("Soporte Técnico", "/support", "fa-solid fa-headset"),
    ]
}
